use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockpool_core::{CategoryId, DomainError};
use stockpool_inventory::{CatalogProduct, CategoryDeductionConfig};

use crate::store::StoreError;

/// Catalog read or write failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A configuration was refused by domain validation.
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves product SKUs to their category.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_by_sku(&self, sku: &str) -> Result<Option<CatalogProduct>, CatalogError>;
}

/// Resolves a category to its owning pool and per-order deduction settings.
#[async_trait]
pub trait CategoryCatalog: Send + Sync {
    async fn get_deduction_config(
        &self,
        category_id: &CategoryId,
    ) -> Result<Option<CategoryDeductionConfig>, CatalogError>;
}

#[async_trait]
impl<S> ProductCatalog for Arc<S>
where
    S: ProductCatalog + ?Sized,
{
    async fn get_by_sku(&self, sku: &str) -> Result<Option<CatalogProduct>, CatalogError> {
        (**self).get_by_sku(sku).await
    }
}

#[async_trait]
impl<S> CategoryCatalog for Arc<S>
where
    S: CategoryCatalog + ?Sized,
{
    async fn get_deduction_config(
        &self,
        category_id: &CategoryId,
    ) -> Result<Option<CategoryDeductionConfig>, CatalogError> {
        (**self).get_deduction_config(category_id).await
    }
}
