//! Order-driven inventory deduction.
//!
//! Flow: order lines → `DeductionResolver` (catalog lookups, one request per
//! line) → `InventoryDeductionCoordinator` (group by pool, validate, one store
//! update per pool) → `DeductionReport`.
//!
//! Manual adjustments go through the coordinator's `adjust`, which shares the
//! same pool update primitive.

pub mod adjustment;
pub mod coordinator;
pub mod resolver;
pub mod service;

pub use adjustment::AdjustmentError;
pub use coordinator::{DeductionError, InventoryDeductionCoordinator};
pub use resolver::{DeductionPreview, DeductionResolver, LineResolution, PoolTotal, PreviewLine};
pub use service::{OrderDeductionError, OrderDeductionService};
