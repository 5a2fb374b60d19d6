//! Manual single-pool adjustments (increase / decrease / set).

use thiserror::Error;
use tracing::info;

use stockpool_core::{DomainError, PoolId};
use stockpool_inventory::{AdjustmentOutcome, AdjustmentRequest, MovementKind, MovementMetadata};

use super::coordinator::InventoryDeductionCoordinator;
use crate::store::{InventoryPoolStore, StoreError};

/// Manual adjustment failure.
///
/// Adjustments target one pool and have no partial-success notion, so every
/// problem is returned as an error.
#[derive(Debug, Error)]
pub enum AdjustmentError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("category group not found: {0}")]
    PoolNotFound(PoolId),

    #[error("store error on pool {pool_id}: {source}")]
    Store {
        pool_id: PoolId,
        #[source]
        source: StoreError,
    },
}

impl<S: InventoryPoolStore> InventoryDeductionCoordinator<S> {
    /// Apply an operator adjustment through the same pool update primitive
    /// deductions use, tagging the movement with reason and actor.
    ///
    /// `Set` derives its delta from the level read just before the update.
    pub async fn adjust(
        &self,
        request: AdjustmentRequest,
    ) -> Result<AdjustmentOutcome, AdjustmentError> {
        request.validate()?;

        let store_err = |source| AdjustmentError::Store {
            pool_id: request.pool_id.clone(),
            source,
        };

        let pool = self
            .pools
            .get_pool(&request.pool_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| AdjustmentError::PoolNotFound(request.pool_id.clone()))?;

        let delta = request.delta(pool.current_quantity)?;
        let metadata = MovementMetadata {
            reason: Some(request.reason.clone()),
            notes: request.notes.clone(),
            actor: Some(request.actor.clone()),
            adjustment: Some(request.kind),
            requested_quantity: Some(request.quantity),
            ..MovementMetadata::default()
        };

        let update = self
            .pools
            .update_pool(&request.pool_id, delta, MovementKind::Adjustment, metadata)
            .await
            .map_err(store_err)?;

        info!(
            pool = %request.pool_id,
            kind = %request.kind,
            quantity = %request.quantity,
            delta = %delta,
            new_level = %update.new_level,
            actor = %request.actor,
            "manual adjustment applied"
        );

        Ok(AdjustmentOutcome {
            pool_id: request.pool_id,
            kind: request.kind,
            previous_level: update.previous_level,
            new_level: update.new_level,
            movement_id: update.movement_id,
        })
    }
}
