//! Deduction requests and the outcomes a deduction run reports.
//!
//! Outcomes are data, not errors: a run over many requests reports every
//! deduction, warning and failure so that one bad line never hides the rest.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockpool_core::{MovementId, PoolId};

use crate::order::OrderContext;
use crate::pool::Unit;

/// One pool-scoped deduction, built from a single order line item.
///
/// `pool_id` is `None` when the line's category has deduction enabled but no
/// category group; the coordinator reports that as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionRequest {
    pub pool_id: Option<PoolId>,
    pub quantity: Decimal,
    pub unit: Unit,
    pub product_sku: String,
    pub order_reference: String,
    pub transaction_reference: Option<String>,
    pub platform: Option<String>,
}

impl DeductionRequest {
    pub fn new(
        pool_id: Option<PoolId>,
        quantity: Decimal,
        unit: Unit,
        product_sku: impl Into<String>,
        context: &OrderContext,
    ) -> Self {
        Self {
            pool_id,
            quantity,
            unit,
            product_sku: product_sku.into(),
            order_reference: context.order_reference.clone(),
            transaction_reference: context.transaction_reference.clone(),
            platform: context.platform.clone(),
        }
    }
}

/// A request that was applied to its pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionEntry {
    pub pool_id: PoolId,
    pub product_sku: String,
    /// This request's own quantity.
    pub requested_qty: Decimal,
    pub deducted_qty: Decimal,
    /// Pool level after the single grouped update.
    pub new_level: Decimal,
    pub movement_id: MovementId,
    pub below_threshold: bool,
}

/// A deduction that went through but left the pool short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionWarning {
    pub pool_id: PoolId,
    pub message: String,
    pub requested_qty: Decimal,
    pub available_qty: Decimal,
}

/// Why a request could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    MissingPoolMapping,
    PoolNotFound,
    UnitMismatch,
    /// A quantity or resulting level does not fit the decimal range.
    QuantityOutOfRange,
}

impl ErrorReason {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorReason::MissingPoolMapping => "Missing category group mapping",
            ErrorReason::PoolNotFound => "Category group not found",
            ErrorReason::UnitMismatch => "Unit mismatch",
            ErrorReason::QuantityOutOfRange => "Quantity out of range",
        }
    }
}

impl core::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// A request (or pool group of requests) that was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionFailure {
    /// `None` when the request had no pool at all.
    pub pool_id: Option<PoolId>,
    pub message: String,
    pub requested_qty: Decimal,
    pub reason: ErrorReason,
    /// SKUs of the requests this failure covers.
    pub skus: Vec<String>,
}

impl DeductionFailure {
    pub fn new(
        pool_id: Option<PoolId>,
        reason: ErrorReason,
        requested_qty: Decimal,
        skus: Vec<String>,
        detail: Option<String>,
    ) -> Self {
        let message = match detail {
            Some(d) => format!("{}: {d}", reason.message()),
            None => reason.message().to_string(),
        };
        Self {
            pool_id,
            message,
            requested_qty,
            reason,
            skus,
        }
    }

    pub fn pool_label(&self) -> &str {
        self.pool_id.as_ref().map_or("unknown", PoolId::as_str)
    }
}

/// Everything one deduction run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionReport {
    pub deductions: Vec<DeductionEntry>,
    pub warnings: Vec<DeductionWarning>,
    pub errors: Vec<DeductionFailure>,
}

impl DeductionReport {
    /// No warnings and no errors.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }

    pub fn errors_with(&self, reason: ErrorReason) -> impl Iterator<Item = &DeductionFailure> {
        self.errors.iter().filter(move |e| e.reason == reason)
    }
}
