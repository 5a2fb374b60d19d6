use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use stockpool_core::{MovementId, PoolId};
use stockpool_inventory::{InventoryPool, MovementKind, MovementMetadata};

/// Persistence failure from the remote document store.
///
/// These are **infrastructure errors** (availability, missing documents, limits)
/// as opposed to domain errors (validation, invariants).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document already exists: {0}")]
    AlreadyExists(String),

    #[error("batch of {size} operations exceeds store limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    /// The store refused an update it could not apply (e.g. out-of-range level).
    /// Nothing was written.
    #[error("update rejected: {0}")]
    Rejected(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Result of one pool counter update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolUpdate {
    pub previous_level: Decimal,
    pub new_level: Decimal,
    pub movement_id: MovementId,
    pub below_threshold: bool,
}

/// Document-store-backed inventory pools.
///
/// ## Update semantics
///
/// `update_pool` applies `delta` to the stored counter as a single increment at
/// the storage layer (no read-modify-write in application code) and writes one
/// movement record alongside it. The returned levels are the ones the increment
/// observed, so callers can reason about shortfalls without a separate read.
#[async_trait]
pub trait InventoryPoolStore: Send + Sync {
    /// Load one pool, `None` when absent.
    async fn get_pool(&self, pool_id: &PoolId) -> Result<Option<InventoryPool>, StoreError>;

    /// Apply a signed delta and record a movement.
    async fn update_pool(
        &self,
        pool_id: &PoolId,
        delta: Decimal,
        kind: MovementKind,
        metadata: MovementMetadata,
    ) -> Result<PoolUpdate, StoreError>;
}

#[async_trait]
impl<S> InventoryPoolStore for Arc<S>
where
    S: InventoryPoolStore + ?Sized,
{
    async fn get_pool(&self, pool_id: &PoolId) -> Result<Option<InventoryPool>, StoreError> {
        (**self).get_pool(pool_id).await
    }

    async fn update_pool(
        &self,
        pool_id: &PoolId,
        delta: Decimal,
        kind: MovementKind,
        metadata: MovementMetadata,
    ) -> Result<PoolUpdate, StoreError> {
        (**self).update_pool(pool_id, delta, kind, metadata).await
    }
}
