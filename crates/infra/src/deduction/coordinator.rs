//! Pool-scoped deduction: validation, aggregation and the single update per pool.

use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use stockpool_core::PoolId;
use stockpool_inventory::{
    DeductionEntry, DeductionFailure, DeductionReport, DeductionRequest, DeductionWarning,
    ErrorReason, InventoryPool, MovementKind, MovementMetadata,
};

use crate::store::{InventoryPoolStore, StoreError};

/// Store failure during a deduction run.
///
/// Mapping, unit, range and lookup problems are reported in [`DeductionReport`];
/// only a failing store call aborts the run. Pools processed before the failure
/// stay committed and are listed in `partial`.
#[derive(Debug, Error)]
pub enum DeductionError {
    #[error("store error on pool {pool_id}: {source}")]
    Store {
        pool_id: PoolId,
        #[source]
        source: StoreError,
        partial: Box<DeductionReport>,
    },
}

impl DeductionError {
    /// Outcomes already applied when the run stopped.
    pub fn partial_report(&self) -> &DeductionReport {
        match self {
            DeductionError::Store { partial, .. } => partial,
        }
    }
}

/// Applies pool-scoped deduction requests to the pool store.
///
/// Requests are grouped by pool and each pool receives exactly one update, so
/// store calls are bounded by the number of distinct pools an order touches.
/// Pools are processed sequentially in first-seen order.
#[derive(Debug)]
pub struct InventoryDeductionCoordinator<S> {
    pub(crate) pools: S,
}

impl<S: InventoryPoolStore> InventoryDeductionCoordinator<S> {
    pub fn new(pools: S) -> Self {
        Self { pools }
    }

    pub fn pools(&self) -> &S {
        &self.pools
    }

    pub async fn deduct(
        &self,
        requests: &[DeductionRequest],
    ) -> Result<DeductionReport, DeductionError> {
        let mut report = DeductionReport::default();

        let mut order: Vec<PoolId> = Vec::new();
        let mut groups: HashMap<PoolId, Vec<&DeductionRequest>> = HashMap::new();
        for req in requests {
            match &req.pool_id {
                None => {
                    warn!(sku = %req.product_sku, "deduction request without category group");
                    report.errors.push(DeductionFailure::new(
                        None,
                        ErrorReason::MissingPoolMapping,
                        req.quantity,
                        vec![req.product_sku.clone()],
                        None,
                    ));
                }
                Some(pool_id) => {
                    groups
                        .entry(pool_id.clone())
                        .or_insert_with(|| {
                            order.push(pool_id.clone());
                            Vec::new()
                        })
                        .push(req);
                }
            }
        }

        for pool_id in order {
            let group = groups.remove(&pool_id).unwrap_or_default();
            if let Err(source) = self.deduct_group(&pool_id, &group, &mut report).await {
                error!(
                    pool = %pool_id,
                    error = %source,
                    applied = report.deductions.len(),
                    "store failure; deduction run aborted"
                );
                return Err(DeductionError::Store {
                    pool_id,
                    source,
                    partial: Box::new(report),
                });
            }
        }

        info!(
            requests = requests.len(),
            deductions = report.deductions.len(),
            warnings = report.warnings.len(),
            errors = report.errors.len(),
            "deduction run finished"
        );
        Ok(report)
    }

    async fn deduct_group(
        &self,
        pool_id: &PoolId,
        group: &[&DeductionRequest],
        report: &mut DeductionReport,
    ) -> Result<(), StoreError> {
        let skus: Vec<String> = group.iter().map(|r| r.product_sku.clone()).collect();

        let Some(total) = group
            .iter()
            .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.quantity))
        else {
            warn!(pool = %pool_id, requests = group.len(), "group total out of range; skipping pool");
            report.errors.push(DeductionFailure::new(
                Some(pool_id.clone()),
                ErrorReason::QuantityOutOfRange,
                saturating_total(group),
                skus,
                Some("group total is not representable".to_string()),
            ));
            return Ok(());
        };

        let Some(pool) = self.pools.get_pool(pool_id).await? else {
            warn!(pool = %pool_id, "category group not found");
            report.errors.push(DeductionFailure::new(
                Some(pool_id.clone()),
                ErrorReason::PoolNotFound,
                total,
                skus,
                None,
            ));
            return Ok(());
        };

        if let Some(mismatch) = group.iter().find(|r| r.unit != pool.unit) {
            warn!(
                pool = %pool_id,
                pool_unit = %pool.unit,
                request_unit = %mismatch.unit,
                sku = %mismatch.product_sku,
                "unit mismatch; skipping pool"
            );
            report.errors.push(DeductionFailure::new(
                Some(pool_id.clone()),
                ErrorReason::UnitMismatch,
                total,
                skus,
                Some(format!(
                    "pool is in {}, {} requested in {}",
                    pool.unit, mismatch.product_sku, mismatch.unit
                )),
            ));
            return Ok(());
        }

        let update = match self
            .pools
            .update_pool(
                pool_id,
                -total,
                MovementKind::Deduction,
                deduction_metadata(group, skus.clone()),
            )
            .await
        {
            Ok(update) => update,
            Err(StoreError::Rejected(detail)) => {
                warn!(pool = %pool_id, total = %total, detail = %detail, "pool update rejected");
                report.errors.push(DeductionFailure::new(
                    Some(pool_id.clone()),
                    ErrorReason::QuantityOutOfRange,
                    total,
                    skus,
                    Some(detail),
                ));
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        debug!(
            pool = %pool_id,
            total = %total,
            new_level = %update.new_level,
            movement = %update.movement_id,
            "pool deducted"
        );

        // Levels come from the store's own increment, not from the earlier read.
        if total > update.previous_level {
            report
                .warnings
                .push(shortfall_warning(&pool, total, update.previous_level));
        }

        for req in group {
            report.deductions.push(DeductionEntry {
                pool_id: pool_id.clone(),
                product_sku: req.product_sku.clone(),
                requested_qty: req.quantity,
                deducted_qty: req.quantity,
                new_level: update.new_level,
                movement_id: update.movement_id,
                below_threshold: update.below_threshold,
            });
        }

        Ok(())
    }
}

fn saturating_total(group: &[&DeductionRequest]) -> Decimal {
    group
        .iter()
        .fold(Decimal::ZERO, |acc, r| acc.saturating_add(r.quantity))
}

fn deduction_metadata(group: &[&DeductionRequest], skus: Vec<String>) -> MovementMetadata {
    let first = group.first();
    MovementMetadata {
        order_reference: first.map(|r| r.order_reference.clone()),
        transaction_reference: first.and_then(|r| r.transaction_reference.clone()),
        platform: first.and_then(|r| r.platform.clone()),
        reason: first.map(|r| format!("order {}", r.order_reference)),
        skus,
        ..MovementMetadata::default()
    }
}

fn shortfall_warning(pool: &InventoryPool, requested: Decimal, available: Decimal) -> DeductionWarning {
    warn!(
        pool = %pool.id,
        requested = %requested,
        available = %available,
        "insufficient stock; deduction applied anyway"
    );
    DeductionWarning {
        pool_id: pool.id.clone(),
        message: format!(
            "Insufficient stock in {}: requested {requested} {}, available {available}",
            pool.name, pool.unit
        ),
        requested_qty: requested,
        available_qty: available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryInventoryPoolStore, PoolUpdate};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use stockpool_inventory::{OrderContext, Unit};

    fn pool_id(id: &str) -> PoolId {
        PoolId::new(id).unwrap()
    }

    fn request(pool: Option<&str>, quantity: Decimal, unit: Unit, sku: &str) -> DeductionRequest {
        DeductionRequest::new(
            pool.map(pool_id),
            quantity,
            unit,
            sku,
            &OrderContext::new("ORD-7").with_transaction("TX-1"),
        )
    }

    fn coordinator(pools: &[(&str, Unit, Decimal)]) -> InventoryDeductionCoordinator<Arc<InMemoryInventoryPoolStore>> {
        let store = Arc::new(InMemoryInventoryPoolStore::new());
        for (id, unit, qty) in pools {
            store
                .insert_pool(
                    InventoryPool::new(pool_id(id), id.to_string(), *unit)
                        .with_quantity(*qty)
                        .with_threshold(dec!(10)),
                )
                .unwrap();
        }
        InventoryDeductionCoordinator::new(store)
    }

    #[tokio::test]
    async fn missing_pool_mapping_is_an_error_not_a_drop() {
        let c = coordinator(&[]);
        let report = c
            .deduct(&[request(None, dec!(3), Unit::Piece, "BOX")])
            .await
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].reason, ErrorReason::MissingPoolMapping);
        assert_eq!(report.errors[0].message, "Missing category group mapping");
        assert_eq!(report.errors[0].pool_label(), "unknown");
        assert!(report.deductions.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn unit_mismatch_blocks_the_whole_pool() {
        let c = coordinator(&[("flour", Unit::Kilogram, dec!(50))]);
        let report = c
            .deduct(&[
                request(Some("flour"), dec!(1), Unit::Kilogram, "BREAD"),
                request(Some("flour"), dec!(200), Unit::Gram, "ROLL"),
            ])
            .await
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].reason, ErrorReason::UnitMismatch);
        assert!(report.errors[0].message.starts_with("Unit mismatch"));
        assert!(report.deductions.is_empty());
        assert!(c.pools().movements(&pool_id("flour")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_pool_is_reported() {
        let c = coordinator(&[]);
        let report = c
            .deduct(&[request(Some("ghost"), dec!(1), Unit::Piece, "X")])
            .await
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].reason, ErrorReason::PoolNotFound);
        assert_eq!(report.errors[0].message, "Category group not found");
        assert_eq!(report.errors[0].pool_label(), "ghost");
    }

    #[tokio::test]
    async fn requests_on_one_pool_share_a_single_update() {
        let c = coordinator(&[("cups", Unit::Piece, dec!(100))]);
        let report = c
            .deduct(&[
                request(Some("cups"), dec!(5), Unit::Piece, "LATTE"),
                request(Some("cups"), dec!(10), Unit::Piece, "MOCHA"),
            ])
            .await
            .unwrap();

        let movements = c.pools().movements(&pool_id("cups")).unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].delta, dec!(-15));
        assert_eq!(movements[0].metadata.skus, vec!["LATTE", "MOCHA"]);
        assert_eq!(movements[0].metadata.order_reference.as_deref(), Some("ORD-7"));
        assert_eq!(movements[0].metadata.transaction_reference.as_deref(), Some("TX-1"));

        assert!(report.is_clean());
        assert_eq!(report.deductions.len(), 2);
        assert_eq!(report.deductions[0].requested_qty, dec!(5));
        assert_eq!(report.deductions[1].requested_qty, dec!(10));
        assert_eq!(report.deductions[0].new_level, dec!(85));
        assert_eq!(report.deductions[1].new_level, dec!(85));
        assert_eq!(report.deductions[0].movement_id, movements[0].id);
        assert_eq!(report.deductions[1].movement_id, movements[0].id);
    }

    #[tokio::test]
    async fn shortfall_warns_but_still_deducts() {
        let c = coordinator(&[("cups", Unit::Piece, dec!(20))]);
        let report = c
            .deduct(&[request(Some("cups"), dec!(100), Unit::Piece, "LATTE")])
            .await
            .unwrap();

        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].requested_qty, dec!(100));
        assert_eq!(report.warnings[0].available_qty, dec!(20));
        assert_eq!(report.deductions.len(), 1);
        assert_eq!(report.deductions[0].new_level, dec!(-80));
        assert!(report.deductions[0].below_threshold);
    }

    #[tokio::test]
    async fn failures_do_not_stop_other_pools() {
        let c = coordinator(&[
            ("cups", Unit::Piece, dec!(20)),
            ("milk", Unit::Kilogram, dec!(5)),
        ]);
        let report = c
            .deduct(&[
                request(None, dec!(1), Unit::Piece, "A"),
                request(Some("milk"), dec!(1), Unit::Piece, "B"),
                request(Some("ghost"), dec!(1), Unit::Piece, "C"),
                request(Some("cups"), dec!(2), Unit::Piece, "D"),
            ])
            .await
            .unwrap();

        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.errors_with(ErrorReason::UnitMismatch).count(), 1);
        assert_eq!(report.deductions.len(), 1);
        assert_eq!(report.deductions[0].new_level, dec!(18));
    }

    #[tokio::test]
    async fn overflowing_group_total_is_reported_not_applied() {
        let c = coordinator(&[
            ("cups", Unit::Piece, dec!(100)),
            ("lids", Unit::Piece, dec!(100)),
        ]);
        let report = c
            .deduct(&[
                request(Some("cups"), Decimal::MAX, Unit::Piece, "BULK-A"),
                request(Some("cups"), dec!(1), Unit::Piece, "BULK-B"),
                request(Some("lids"), dec!(3), Unit::Piece, "LID"),
            ])
            .await
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].reason, ErrorReason::QuantityOutOfRange);
        assert_eq!(report.errors[0].skus, vec!["BULK-A", "BULK-B"]);
        assert!(c.pools().movements(&pool_id("cups")).unwrap().is_empty());

        assert_eq!(report.deductions.len(), 1);
        assert_eq!(report.deductions[0].new_level, dec!(97));
    }

    #[tokio::test]
    async fn level_out_of_range_is_reported_and_store_stays_usable() {
        let store = Arc::new(InMemoryInventoryPoolStore::new());
        store
            .insert_pool(
                InventoryPool::new(pool_id("cups"), "Cups", Unit::Piece).with_quantity(Decimal::MIN),
            )
            .unwrap();
        store
            .insert_pool(InventoryPool::new(pool_id("lids"), "Lids", Unit::Piece).with_quantity(dec!(5)))
            .unwrap();
        let c = InventoryDeductionCoordinator::new(store);

        let report = c
            .deduct(&[
                request(Some("cups"), dec!(1), Unit::Piece, "LATTE"),
                request(Some("lids"), dec!(1), Unit::Piece, "LID"),
            ])
            .await
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].reason, ErrorReason::QuantityOutOfRange);
        assert!(report.errors[0].message.starts_with("Quantity out of range: "));
        assert_eq!(report.deductions.len(), 1);
        assert_eq!(report.deductions[0].new_level, dec!(4));
    }

    /// Store whose updates always fail.
    struct BrokenStore(InMemoryInventoryPoolStore);

    #[async_trait]
    impl InventoryPoolStore for BrokenStore {
        async fn get_pool(&self, pool_id: &PoolId) -> Result<Option<InventoryPool>, StoreError> {
            self.0.get_pool(pool_id).await
        }

        async fn update_pool(
            &self,
            _pool_id: &PoolId,
            _delta: Decimal,
            _kind: MovementKind,
            _metadata: MovementMetadata,
        ) -> Result<PoolUpdate, StoreError> {
            Err(StoreError::Unavailable("write quorum lost".to_string()))
        }
    }

    #[tokio::test]
    async fn store_error_propagates_without_retry() {
        let inner = InMemoryInventoryPoolStore::new();
        inner
            .insert_pool(InventoryPool::new(pool_id("cups"), "Cups", Unit::Piece))
            .unwrap();
        let c = InventoryDeductionCoordinator::new(BrokenStore(inner));

        let err = c
            .deduct(&[request(Some("cups"), dec!(1), Unit::Piece, "LATTE")])
            .await
            .unwrap_err();
        assert!(matches!(err, DeductionError::Store { .. }));
        assert!(err.partial_report().deductions.is_empty());
    }

    /// Store that fails updates for one pool only.
    struct FailsOn(InMemoryInventoryPoolStore, PoolId);

    #[async_trait]
    impl InventoryPoolStore for FailsOn {
        async fn get_pool(&self, pool_id: &PoolId) -> Result<Option<InventoryPool>, StoreError> {
            self.0.get_pool(pool_id).await
        }

        async fn update_pool(
            &self,
            pool_id: &PoolId,
            delta: Decimal,
            kind: MovementKind,
            metadata: MovementMetadata,
        ) -> Result<PoolUpdate, StoreError> {
            if *pool_id == self.1 {
                return Err(StoreError::Unavailable("write quorum lost".to_string()));
            }
            self.0.update_pool(pool_id, delta, kind, metadata).await
        }
    }

    #[tokio::test]
    async fn store_error_carries_what_was_already_applied() {
        let inner = InMemoryInventoryPoolStore::new();
        for id in ["cups", "lids"] {
            inner
                .insert_pool(InventoryPool::new(pool_id(id), id, Unit::Piece).with_quantity(dec!(10)))
                .unwrap();
        }
        let c = InventoryDeductionCoordinator::new(FailsOn(inner, pool_id("lids")));

        let err = c
            .deduct(&[
                request(Some("cups"), dec!(2), Unit::Piece, "LATTE"),
                request(Some("lids"), dec!(2), Unit::Piece, "LID"),
            ])
            .await
            .unwrap_err();

        let DeductionError::Store { pool_id: failed, .. } = &err;
        assert_eq!(failed, &pool_id("lids"));
        let partial = err.partial_report();
        assert_eq!(partial.deductions.len(), 1);
        assert_eq!(partial.deductions[0].pool_id, pool_id("cups"));
        assert_eq!(partial.deductions[0].new_level, dec!(8));
    }
}
