//! Inventory pool persistence boundary.
//!
//! Defines the pool store the deduction path writes through, plus an in-memory
//! adapter for tests/dev.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryInventoryPoolStore, UnitChangeError};
pub use r#trait::{InventoryPoolStore, PoolUpdate, StoreError};
