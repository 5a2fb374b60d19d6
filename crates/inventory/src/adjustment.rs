use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockpool_core::{DomainError, DomainResult, MovementId, PoolId};

/// Manual adjustment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Increase,
    Decrease,
    /// Overwrite the level with an absolute count (e.g. after a stocktake).
    Set,
}

impl AdjustmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentKind::Increase => "increase",
            AdjustmentKind::Decrease => "decrease",
            AdjustmentKind::Set => "set",
        }
    }
}

impl core::fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdjustmentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increase" => Ok(AdjustmentKind::Increase),
            "decrease" => Ok(AdjustmentKind::Decrease),
            "set" => Ok(AdjustmentKind::Set),
            other => Err(DomainError::validation(format!(
                "unrecognized adjustment type '{other}'"
            ))),
        }
    }
}

/// Operator-initiated change to a single pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub pool_id: PoolId,
    pub kind: AdjustmentKind,
    /// Always non-negative; the kind decides the direction.
    pub quantity: Decimal,
    pub reason: String,
    pub notes: Option<String>,
    pub actor: String,
}

impl AdjustmentRequest {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "adjustment quantity must be non-negative, got {}",
                self.quantity
            )));
        }
        Ok(())
    }

    /// Signed delta to apply to a pool currently at `current`.
    pub fn delta(&self, current: Decimal) -> DomainResult<Decimal> {
        match self.kind {
            AdjustmentKind::Increase => Ok(self.quantity),
            AdjustmentKind::Decrease => Ok(-self.quantity),
            AdjustmentKind::Set => self.quantity.checked_sub(current).ok_or_else(|| {
                DomainError::validation(format!(
                    "cannot set pool {} from {current} to {}: delta out of range",
                    self.pool_id, self.quantity
                ))
            }),
        }
    }
}

/// Result of a successful manual adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentOutcome {
    pub pool_id: PoolId,
    pub kind: AdjustmentKind,
    pub previous_level: Decimal,
    pub new_level: Decimal,
    pub movement_id: MovementId,
}
