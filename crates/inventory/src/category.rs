use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockpool_core::{CategoryId, DomainError, DomainResult, Entity, PoolId};

use crate::pool::Unit;

/// Whether a category draws down its pool by count or by weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductionType {
    Quantity,
    Weight,
}

/// Per-category deduction configuration.
///
/// `deduction_quantity` is the amount removed from the owning pool per unit of
/// product ordered, denominated in `unit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDeductionConfig {
    pub category_id: CategoryId,
    pub pool_id: Option<PoolId>,
    pub deduction_quantity: Option<Decimal>,
    pub unit: Unit,
    pub deduction_type: DeductionType,
}

impl CategoryDeductionConfig {
    /// Returns the per-unit deduction when deduction is enabled.
    pub fn enabled_quantity(&self) -> Option<Decimal> {
        self.deduction_quantity.filter(|q| *q > Decimal::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled_quantity().is_some()
    }

    /// Refuse configurations that can never deduct correctly.
    pub fn validate(&self) -> DomainResult<()> {
        if self.is_enabled() && self.pool_id.is_none() {
            return Err(DomainError::validation(format!(
                "category {} has a deduction quantity but no category group",
                self.category_id
            )));
        }

        let unit_ok = match self.deduction_type {
            DeductionType::Quantity => self.unit == Unit::Piece,
            DeductionType::Weight => self.unit.is_weight(),
        };
        if !unit_ok {
            return Err(DomainError::validation(format!(
                "category {}: unit {} does not fit {:?} deduction",
                self.category_id, self.unit, self.deduction_type
            )));
        }

        Ok(())
    }
}

impl Entity for CategoryDeductionConfig {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.category_id
    }
}

/// The slice of a catalog product that deduction cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub sku: String,
    pub category_id: Option<CategoryId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config(pool: Option<&str>, qty: Option<Decimal>) -> CategoryDeductionConfig {
        CategoryDeductionConfig {
            category_id: CategoryId::new("bread").unwrap(),
            pool_id: pool.map(|p| PoolId::new(p).unwrap()),
            deduction_quantity: qty,
            unit: Unit::Kilogram,
            deduction_type: DeductionType::Weight,
        }
    }

    #[test]
    fn enabled_deduction_requires_pool() {
        assert!(config(None, Some(dec!(0.5))).validate().is_err());
        assert!(config(Some("flour"), Some(dec!(0.5))).validate().is_ok());
    }

    #[test]
    fn disabled_deduction_needs_no_pool() {
        assert!(config(None, None).validate().is_ok());
        assert!(config(None, Some(dec!(0))).validate().is_ok());
        assert!(config(None, Some(dec!(-1))).validate().is_ok());
        assert!(!config(None, Some(dec!(-1))).is_enabled());
    }

    #[test]
    fn unit_must_match_deduction_type() {
        let mut c = config(Some("flour"), Some(dec!(1)));
        c.unit = Unit::Piece;
        assert!(c.validate().is_err());

        c.deduction_type = DeductionType::Quantity;
        assert!(c.validate().is_ok());

        c.unit = Unit::Gram;
        assert!(c.validate().is_err());
    }
}
