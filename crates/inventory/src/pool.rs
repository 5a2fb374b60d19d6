use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockpool_core::{DomainError, DomainResult, Entity, MovementId, PoolId};

use crate::adjustment::AdjustmentKind;

/// Unit a pool (and every quantity drawn from it) is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Piece,
    Kilogram,
    Gram,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Piece => "piece",
            Unit::Kilogram => "kilogram",
            Unit::Gram => "gram",
        }
    }

    /// Weight units can carry fractional quantities; pieces are counted.
    pub fn is_weight(&self) -> bool {
        matches!(self, Unit::Kilogram | Unit::Gram)
    }
}

impl core::fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Unit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "piece" | "pcs" | "pc" => Ok(Unit::Piece),
            "kilogram" | "kg" => Ok(Unit::Kilogram),
            "gram" | "g" => Ok(Unit::Gram),
            other => Err(DomainError::validation(format!("unknown unit '{other}'"))),
        }
    }
}

/// A named, shared inventory counter ("category group").
///
/// Quantities are signed: deductions are allowed to drive a pool below zero so
/// that bookkeeping for an already-placed order is never blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryPool {
    pub id: PoolId,
    pub name: String,
    pub current_quantity: Decimal,
    pub unit: Unit,
    pub minimum_threshold: Decimal,
}

impl InventoryPool {
    pub fn new(id: PoolId, name: impl Into<String>, unit: Unit) -> Self {
        Self {
            id,
            name: name.into(),
            current_quantity: Decimal::ZERO,
            unit,
            minimum_threshold: Decimal::ZERO,
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.current_quantity = quantity;
        self
    }

    pub fn with_threshold(mut self, threshold: Decimal) -> Self {
        self.minimum_threshold = threshold;
        self
    }

    pub fn is_below_threshold(&self) -> bool {
        self.current_quantity <= self.minimum_threshold
    }

    /// Change the pool's unit.
    ///
    /// Existing movements are denominated in the current unit, so the change is
    /// refused once any movement has been recorded against the pool.
    pub fn change_unit(&mut self, unit: Unit, movement_count: usize) -> DomainResult<()> {
        if unit == self.unit {
            return Ok(());
        }
        if movement_count > 0 {
            return Err(DomainError::invariant(format!(
                "cannot change unit of pool {} from {} to {}: {} movement(s) recorded",
                self.id, self.unit, unit, movement_count
            )));
        }
        self.unit = unit;
        Ok(())
    }

    /// Apply a signed delta and return the new level.
    ///
    /// A delta that would take the level out of `Decimal` range is refused and
    /// the pool is left untouched.
    pub fn apply_delta(&mut self, delta: Decimal) -> DomainResult<Decimal> {
        let new_level = self.current_quantity.checked_add(delta).ok_or_else(|| {
            DomainError::validation(format!(
                "delta {delta} on pool {} at {} is out of range",
                self.id, self.current_quantity
            ))
        })?;
        self.current_quantity = new_level;
        Ok(new_level)
    }
}

impl Entity for InventoryPool {
    type Id = PoolId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Why a pool counter changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Deduction,
    Adjustment,
}

/// Free-form audit context attached to a movement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementMetadata {
    pub order_reference: Option<String>,
    pub transaction_reference: Option<String>,
    pub skus: Vec<String>,
    pub platform: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub actor: Option<String>,
    /// Set on manual adjustments: which kind, and the quantity the operator entered.
    pub adjustment: Option<AdjustmentKind>,
    pub requested_quantity: Option<Decimal>,
}

/// Audit record produced alongside every pool counter change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub pool_id: PoolId,
    pub kind: MovementKind,
    pub delta: Decimal,
    pub previous_level: Decimal,
    pub new_level: Decimal,
    pub metadata: MovementMetadata,
    pub occurred_at: DateTime<Utc>,
}
