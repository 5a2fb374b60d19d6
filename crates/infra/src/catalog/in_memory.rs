use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use stockpool_core::CategoryId;
use stockpool_inventory::{CatalogProduct, CategoryDeductionConfig};

use super::r#trait::{CatalogError, CategoryCatalog, ProductCatalog};
use crate::store::StoreError;

fn poisoned() -> CatalogError {
    CatalogError::Store(StoreError::Storage("lock poisoned".to_string()))
}

/// In-memory product catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<String, CatalogProduct>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, product: CatalogProduct) -> Result<(), CatalogError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        products.insert(product.sku.clone(), product);
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get_by_sku(&self, sku: &str) -> Result<Option<CatalogProduct>, CatalogError> {
        let products = self.products.read().map_err(|_| poisoned())?;
        Ok(products.get(sku).cloned())
    }
}

/// In-memory category catalog for tests/dev.
///
/// Configurations are validated on write, so a category with deduction
/// enabled but no category group can never be stored here.
#[derive(Debug, Default)]
pub struct InMemoryCategoryCatalog {
    configs: RwLock<HashMap<CategoryId, CategoryDeductionConfig>>,
}

impl InMemoryCategoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, config: CategoryDeductionConfig) -> Result<(), CatalogError> {
        config.validate()?;
        let mut configs = self.configs.write().map_err(|_| poisoned())?;
        configs.insert(config.category_id.clone(), config);
        Ok(())
    }
}

#[async_trait]
impl CategoryCatalog for InMemoryCategoryCatalog {
    async fn get_deduction_config(
        &self,
        category_id: &CategoryId,
    ) -> Result<Option<CategoryDeductionConfig>, CatalogError> {
        let configs = self.configs.read().map_err(|_| poisoned())?;
        Ok(configs.get(category_id).cloned())
    }
}
