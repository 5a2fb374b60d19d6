use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// References shared by every line of one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderContext {
    pub order_reference: String,
    pub transaction_reference: Option<String>,
    pub platform: Option<String>,
}

impl OrderContext {
    pub fn new(order_reference: impl Into<String>) -> Self {
        Self {
            order_reference: order_reference.into(),
            transaction_reference: None,
            platform: None,
        }
    }

    pub fn with_transaction(mut self, reference: impl Into<String>) -> Self {
        self.transaction_reference = Some(reference.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}

/// A raw order line as it arrives from a sales platform or import.
///
/// The quantity is kept as the raw text; marketplaces and spreadsheets
/// regularly deliver values that are not numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub sku: Option<String>,
    pub quantity: String,
}

impl OrderLineItem {
    pub fn new(sku: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            sku: Some(sku.into()),
            quantity: quantity.into(),
        }
    }

    /// SKU with surrounding whitespace removed; blank SKUs count as absent.
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Ordered quantity, if it is a positive number.
    pub fn ordered_quantity(&self) -> Option<Decimal> {
        Decimal::from_str(self.quantity.trim())
            .ok()
            .filter(|q| *q > Decimal::ZERO)
    }
}
