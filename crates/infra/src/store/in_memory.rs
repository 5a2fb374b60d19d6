use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use stockpool_core::{DomainError, MovementId, PoolId};
use stockpool_inventory::{InventoryPool, Movement, MovementKind, MovementMetadata, Unit};

use super::r#trait::{InventoryPoolStore, PoolUpdate, StoreError};

#[derive(Debug, Default)]
struct State {
    pools: HashMap<PoolId, InventoryPool>,
    movements: HashMap<PoolId, Vec<Movement>>,
}

/// Failure while changing a pool's unit.
#[derive(Debug, Error)]
pub enum UnitChangeError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// In-memory inventory pool store.
///
/// Intended for tests/dev. Each update takes the write lock once, so the
/// counter change and its movement record are applied together.
#[derive(Debug, Default)]
pub struct InMemoryInventoryPoolStore {
    state: RwLock<State>,
}

impl InMemoryInventoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a pool (catalog management).
    pub fn insert_pool(&self, pool: InventoryPool) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.pools.insert(pool.id.clone(), pool);
        Ok(())
    }

    /// Movement history for a pool, oldest first.
    pub fn movements(&self, pool_id: &PoolId) -> Result<Vec<Movement>, StoreError> {
        let state = self.read()?;
        Ok(state.movements.get(pool_id).cloned().unwrap_or_default())
    }

    /// Change a pool's unit, refused once movements exist against it.
    pub fn change_unit(&self, pool_id: &PoolId, unit: Unit) -> Result<(), UnitChangeError> {
        let mut state = self.write()?;
        let movement_count = state.movements.get(pool_id).map_or(0, Vec::len);
        let pool = state
            .pools
            .get_mut(pool_id)
            .ok_or_else(|| DomainError::not_found(format!("pool {pool_id}")))?;
        pool.change_unit(unit, movement_count)?;
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }
}

#[async_trait]
impl InventoryPoolStore for InMemoryInventoryPoolStore {
    async fn get_pool(&self, pool_id: &PoolId) -> Result<Option<InventoryPool>, StoreError> {
        let state = self.read()?;
        Ok(state.pools.get(pool_id).cloned())
    }

    async fn update_pool(
        &self,
        pool_id: &PoolId,
        delta: Decimal,
        kind: MovementKind,
        metadata: MovementMetadata,
    ) -> Result<PoolUpdate, StoreError> {
        let mut state = self.write()?;

        let pool = state
            .pools
            .get_mut(pool_id)
            .ok_or_else(|| StoreError::NotFound(format!("pool {pool_id}")))?;

        let previous_level = pool.current_quantity;
        let new_level = pool
            .apply_delta(delta)
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        let below_threshold = pool.is_below_threshold();

        let movement = Movement {
            id: MovementId::new(),
            pool_id: pool_id.clone(),
            kind,
            delta,
            previous_level,
            new_level,
            metadata,
            occurred_at: Utc::now(),
        };
        let movement_id = movement.id;
        state
            .movements
            .entry(pool_id.clone())
            .or_default()
            .push(movement);

        Ok(PoolUpdate {
            previous_level,
            new_level,
            movement_id,
            below_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pool_id() -> PoolId {
        PoolId::new("coffee-beans").unwrap()
    }

    fn store() -> InMemoryInventoryPoolStore {
        let store = InMemoryInventoryPoolStore::new();
        store
            .insert_pool(
                InventoryPool::new(pool_id(), "Coffee beans", Unit::Gram)
                    .with_quantity(dec!(1000))
                    .with_threshold(dec!(250)),
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn update_applies_delta_and_records_movement() {
        let store = store();
        let update = store
            .update_pool(
                &pool_id(),
                dec!(-800),
                MovementKind::Deduction,
                MovementMetadata {
                    order_reference: Some("ORD-1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(update.previous_level, dec!(1000));
        assert_eq!(update.new_level, dec!(200));
        assert!(update.below_threshold);

        let movements = store.movements(&pool_id()).unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].id, update.movement_id);
        assert_eq!(movements[0].delta, dec!(-800));
        assert_eq!(movements[0].metadata.order_reference.as_deref(), Some("ORD-1"));

        let pool = store.get_pool(&pool_id()).await.unwrap().unwrap();
        assert_eq!(pool.current_quantity, dec!(200));
    }

    #[tokio::test]
    async fn update_of_missing_pool_fails() {
        let store = InMemoryInventoryPoolStore::new();
        let err = store
            .update_pool(
                &pool_id(),
                dec!(1),
                MovementKind::Adjustment,
                MovementMetadata::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn unit_change_is_refused_after_first_movement() {
        let store = store();
        store.change_unit(&pool_id(), Unit::Kilogram).unwrap();
        store.change_unit(&pool_id(), Unit::Gram).unwrap();

        store
            .update_pool(
                &pool_id(),
                dec!(-1),
                MovementKind::Deduction,
                MovementMetadata::default(),
            )
            .await
            .unwrap();

        let err = store.change_unit(&pool_id(), Unit::Kilogram).unwrap_err();
        assert!(matches!(
            err,
            UnitChangeError::Domain(DomainError::InvariantViolation(_))
        ));
        let pool = store.get_pool(&pool_id()).await.unwrap().unwrap();
        assert_eq!(pool.unit, Unit::Gram);
    }

    #[tokio::test]
    async fn out_of_range_update_is_rejected_and_store_stays_usable() {
        let store = store();
        let err = store
            .update_pool(
                &pool_id(),
                Decimal::MAX,
                MovementKind::Adjustment,
                MovementMetadata::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(store.movements(&pool_id()).unwrap().is_empty());

        let update = store
            .update_pool(
                &pool_id(),
                dec!(1),
                MovementKind::Adjustment,
                MovementMetadata::default(),
            )
            .await
            .unwrap();
        assert_eq!(update.previous_level, dec!(1000));
        assert_eq!(update.new_level, dec!(1001));
    }
}
