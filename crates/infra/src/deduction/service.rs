//! Order-level entry point: resolve lines, then deduct per pool.

use thiserror::Error;
use tracing::info;

use stockpool_inventory::{DeductionReport, OrderContext, OrderLineItem};

use super::coordinator::{DeductionError, InventoryDeductionCoordinator};
use super::resolver::{DeductionPreview, DeductionResolver};
use crate::catalog::{CatalogError, CategoryCatalog, ProductCatalog};
use crate::store::InventoryPoolStore;

#[derive(Debug, Error)]
pub enum OrderDeductionError {
    #[error("catalog lookup failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Deduction(#[from] DeductionError),
}

/// Wires the resolver to the coordinator for one order at a time.
#[derive(Debug)]
pub struct OrderDeductionService<P, C, S> {
    resolver: DeductionResolver<P, C>,
    coordinator: InventoryDeductionCoordinator<S>,
}

impl<P, C, S> OrderDeductionService<P, C, S>
where
    P: ProductCatalog,
    C: CategoryCatalog,
    S: InventoryPoolStore,
{
    pub fn new(resolver: DeductionResolver<P, C>, coordinator: InventoryDeductionCoordinator<S>) -> Self {
        Self {
            resolver,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &InventoryDeductionCoordinator<S> {
        &self.coordinator
    }

    /// What `deduct_order` would do, without touching any pool.
    pub async fn preview_order(
        &self,
        context: &OrderContext,
        items: &[OrderLineItem],
    ) -> Result<DeductionPreview, OrderDeductionError> {
        Ok(self.resolver.preview(context, items).await?)
    }

    pub async fn deduct_order(
        &self,
        context: &OrderContext,
        items: &[OrderLineItem],
    ) -> Result<DeductionReport, OrderDeductionError> {
        let requests = self.resolver.resolve(context, items).await?;
        if requests.is_empty() {
            info!(order = %context.order_reference, "order has no deductible lines");
            return Ok(DeductionReport::default());
        }
        Ok(self.coordinator.deduct(&requests).await?)
    }
}
