//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Inventory pools and category configs are entities: two snapshots with the
/// same id describe the same record at different points in time.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
