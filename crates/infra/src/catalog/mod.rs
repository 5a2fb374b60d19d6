//! Product and category catalog lookups used to resolve order lines to pools.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryCategoryCatalog, InMemoryProductCatalog};
pub use r#trait::{CatalogError, CategoryCatalog, ProductCatalog};
