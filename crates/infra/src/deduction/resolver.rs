//! Order line → pool-scoped deduction request resolution.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use stockpool_core::{CategoryId, PoolId};
use stockpool_inventory::{DeductionRequest, OrderContext, OrderLineItem, Unit};

use crate::catalog::{CatalogError, CategoryCatalog, ProductCatalog};

/// How a single order line resolved.
///
/// `Unmapped` and `NotConfigured` both mean "no deduction", but only the latter
/// points at a catalog gap an operator can fix, so previews surface it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineResolution {
    /// No SKU, unknown SKU, or a product without a category.
    Unmapped,
    /// The category has no deduction config, or its quantity is unset / non-positive.
    NotConfigured { category_id: CategoryId },
    /// The ordered quantity is not a positive number.
    InvalidQuantity { raw: String },
    Resolved(DeductionRequest),
}

impl LineResolution {
    pub fn request(&self) -> Option<&DeductionRequest> {
        match self {
            LineResolution::Resolved(req) => Some(req),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewLine {
    pub sku: Option<String>,
    pub ordered_quantity: String,
    pub resolution: LineResolution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolTotal {
    pub quantity: Decimal,
    pub unit: Unit,
}

/// Dry-run summary: "this order will deduct X from pool Y".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeductionPreview {
    pub items: Vec<PreviewLine>,
    pub totals_by_pool: BTreeMap<PoolId, PoolTotal>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl DeductionPreview {
    pub fn requests(&self) -> impl Iterator<Item = &DeductionRequest> {
        self.items.iter().filter_map(|line| line.resolution.request())
    }
}

/// Resolves order lines through the product and category catalogs.
///
/// Never writes; `resolve` and `preview` differ only in what they report.
#[derive(Debug)]
pub struct DeductionResolver<P, C> {
    products: P,
    categories: C,
}

impl<P, C> DeductionResolver<P, C>
where
    P: ProductCatalog,
    C: CategoryCatalog,
{
    pub fn new(products: P, categories: C) -> Self {
        Self {
            products,
            categories,
        }
    }

    /// One request per qualifying line, in line order. Not aggregated.
    pub async fn resolve(
        &self,
        context: &OrderContext,
        items: &[OrderLineItem],
    ) -> Result<Vec<DeductionRequest>, CatalogError> {
        let mut requests = Vec::new();
        for item in items {
            if let LineResolution::Resolved(req) = self.resolve_line(context, item).await? {
                requests.push(req);
            }
        }
        debug!(
            order = %context.order_reference,
            lines = items.len(),
            requests = requests.len(),
            "resolved order lines"
        );
        Ok(requests)
    }

    pub async fn preview(
        &self,
        context: &OrderContext,
        items: &[OrderLineItem],
    ) -> Result<DeductionPreview, CatalogError> {
        let mut preview = DeductionPreview::default();

        for item in items {
            let resolution = self.resolve_line(context, item).await?;
            let label = item.sku().unwrap_or("<no sku>");

            match &resolution {
                LineResolution::Unmapped => {}
                LineResolution::NotConfigured { category_id } => preview.warnings.push(format!(
                    "{label}: category {category_id} has no deduction configured"
                )),
                LineResolution::InvalidQuantity { raw } => preview
                    .errors
                    .push(format!("{label}: invalid ordered quantity '{raw}'")),
                LineResolution::Resolved(req) => match &req.pool_id {
                    None => preview
                        .errors
                        .push(format!("{label}: Missing category group mapping")),
                    Some(pool_id) => {
                        let total = preview
                            .totals_by_pool
                            .entry(pool_id.clone())
                            .or_insert(PoolTotal {
                                quantity: Decimal::ZERO,
                                unit: req.unit,
                            });
                        if total.unit != req.unit {
                            preview.errors.push(format!(
                                "{label}: Unit mismatch on {pool_id} ({} vs {})",
                                req.unit, total.unit
                            ));
                        } else if let Some(sum) = total.quantity.checked_add(req.quantity) {
                            total.quantity = sum;
                        } else {
                            preview
                                .errors
                                .push(format!("{label}: Quantity out of range on {pool_id}"));
                        }
                    }
                },
            }

            preview.items.push(PreviewLine {
                sku: item.sku.clone(),
                ordered_quantity: item.quantity.clone(),
                resolution,
            });
        }

        Ok(preview)
    }

    async fn resolve_line(
        &self,
        context: &OrderContext,
        item: &OrderLineItem,
    ) -> Result<LineResolution, CatalogError> {
        let Some(sku) = item.sku() else {
            return Ok(LineResolution::Unmapped);
        };
        let Some(product) = self.products.get_by_sku(sku).await? else {
            return Ok(LineResolution::Unmapped);
        };
        let Some(category_id) = product.category_id else {
            return Ok(LineResolution::Unmapped);
        };

        let config = self.categories.get_deduction_config(&category_id).await?;
        let Some((config, per_unit)) =
            config.and_then(|c| c.enabled_quantity().map(|q| (c, q)))
        else {
            return Ok(LineResolution::NotConfigured { category_id });
        };

        let Some(quantity) = item
            .ordered_quantity()
            .and_then(|ordered| per_unit.checked_mul(ordered))
        else {
            return Ok(LineResolution::InvalidQuantity {
                raw: item.quantity.clone(),
            });
        };

        Ok(LineResolution::Resolved(DeductionRequest::new(
            config.pool_id,
            quantity,
            config.unit,
            sku,
            context,
        )))
    }
}
