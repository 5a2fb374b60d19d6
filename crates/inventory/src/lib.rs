//! Inventory domain module.
//!
//! This crate contains the business vocabulary for shared inventory pools and
//! order-driven deductions, implemented purely as deterministic domain logic
//! (no IO, no storage). Services that talk to the document store live in
//! `stockpool-infra`.

pub mod adjustment;
pub mod category;
pub mod deduction;
pub mod order;
pub mod pool;

pub use adjustment::{AdjustmentKind, AdjustmentOutcome, AdjustmentRequest};
pub use category::{CatalogProduct, CategoryDeductionConfig, DeductionType};
pub use deduction::{
    DeductionEntry, DeductionFailure, DeductionReport, DeductionRequest, DeductionWarning,
    ErrorReason,
};
pub use order::{OrderContext, OrderLineItem};
pub use pool::{InventoryPool, Movement, MovementKind, MovementMetadata, Unit};
