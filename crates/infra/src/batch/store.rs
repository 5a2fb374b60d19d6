//! Document store boundary for batched writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::types::{BatchOperation, BatchOperationKind};
use crate::store::StoreError;

/// Per-call operation cap of the document store.
pub const STORE_MAX_BATCH_SIZE: usize = 500;

/// A store that can commit a group of writes atomically.
///
/// `commit` must apply every operation or none of them, and must refuse groups
/// larger than `max_batch_size()`.
#[async_trait]
pub trait DocumentBatchStore: Send + Sync {
    /// Hard per-call operation limit.
    fn max_batch_size(&self) -> usize {
        STORE_MAX_BATCH_SIZE
    }

    /// Cheap reachability probe, run once before a batch run starts.
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn commit(&self, operations: &[BatchOperation]) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> DocumentBatchStore for Arc<S>
where
    S: DocumentBatchStore + ?Sized,
{
    fn max_batch_size(&self) -> usize {
        (**self).max_batch_size()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        (**self).health_check().await
    }

    async fn commit(&self, operations: &[BatchOperation]) -> Result<(), StoreError> {
        (**self).commit(operations).await
    }
}

type Collections = HashMap<String, HashMap<String, JsonValue>>;

/// In-memory document store for tests/dev.
///
/// Commits are staged against a copy of the data and swapped in only when every
/// operation succeeded.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
    available: AtomicBool,
    max_batch_size: usize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_max_batch_size(STORE_MAX_BATCH_SIZE)
    }

    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            max_batch_size,
        }
    }

    /// Simulate the store going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn get(&self, collection: &str, document_id: &str) -> Result<Option<JsonValue>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(document_id))
            .cloned())
    }

    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let collections = self.read()?;
        Ok(collections.get(collection).map_or(0, HashMap::len))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Collections>, StoreError> {
        self.collections
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store offline".to_string()))
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply(staged: &mut Collections, op: &BatchOperation) -> Result<(), StoreError> {
    let docs = staged.entry(op.collection.clone()).or_default();
    let path = format!("{}/{}", op.collection, op.document_id);

    match op.kind {
        BatchOperationKind::Create => {
            if docs.contains_key(&op.document_id) {
                return Err(StoreError::AlreadyExists(path));
            }
            docs.insert(op.document_id.clone(), op.payload.clone());
        }
        BatchOperationKind::Update => {
            let existing = docs
                .get_mut(&op.document_id)
                .ok_or(StoreError::NotFound(path))?;
            match (existing, &op.payload) {
                (JsonValue::Object(current), JsonValue::Object(patch)) => {
                    for (k, v) in patch {
                        current.insert(k.clone(), v.clone());
                    }
                }
                (current, patch) => *current = patch.clone(),
            }
        }
        BatchOperationKind::Delete => {
            docs.remove(&op.document_id);
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentBatchStore for InMemoryDocumentStore {
    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ensure_available()
    }

    async fn commit(&self, operations: &[BatchOperation]) -> Result<(), StoreError> {
        self.ensure_available()?;
        if operations.len() > self.max_batch_size {
            return Err(StoreError::BatchTooLarge {
                size: operations.len(),
                limit: self.max_batch_size,
            });
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

        let mut staged = collections.clone();
        for op in operations {
            apply(&mut staged, op)?;
        }
        *collections = staged;
        Ok(())
    }
}
