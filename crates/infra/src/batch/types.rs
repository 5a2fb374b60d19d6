//! Batch operation types, progress reporting and backoff policies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a single write does to its target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOperationKind {
    Create,
    Update,
    Delete,
}

/// One write against a named collection. Collection-agnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOperation {
    pub kind: BatchOperationKind,
    pub collection: String,
    pub document_id: String,
    pub payload: serde_json::Value,
}

impl BatchOperation {
    pub fn create(
        collection: impl Into<String>,
        document_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            kind: BatchOperationKind::Create,
            collection: collection.into(),
            document_id: document_id.into(),
            payload,
        }
    }

    pub fn update(
        collection: impl Into<String>,
        document_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            kind: BatchOperationKind::Update,
            collection: collection.into(),
            document_id: document_id.into(),
            payload,
        }
    }

    pub fn delete(collection: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            kind: BatchOperationKind::Delete,
            collection: collection.into(),
            document_id: document_id.into(),
            payload: serde_json::Value::Null,
        }
    }
}

/// Cumulative progress, emitted after every chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchProgress {
    pub total_ops: usize,
    pub completed_ops: usize,
    pub failed_ops: usize,
    /// Zero-based index of the chunk that just finished.
    pub current_batch_index: usize,
    pub total_batches: usize,
    /// Share of operations processed (completed or failed), 0.0–100.0.
    pub percentage: f64,
    /// Estimated time to finish; `None` until at least one operation completed.
    pub eta: Option<Duration>,
}

impl BatchProgress {
    pub(crate) fn compute(
        total_ops: usize,
        completed_ops: usize,
        failed_ops: usize,
        current_batch_index: usize,
        total_batches: usize,
        elapsed: Duration,
    ) -> Self {
        let processed = completed_ops + failed_ops;
        let percentage = if total_ops == 0 {
            100.0
        } else {
            processed as f64 * 100.0 / total_ops as f64
        };

        let eta = if completed_ops == 0 {
            None
        } else {
            let remaining = total_ops.saturating_sub(processed);
            Some(elapsed.mul_f64(remaining as f64 / completed_ops as f64))
        };

        Self {
            total_ops,
            completed_ops,
            failed_ops,
            current_batch_index,
            total_batches,
            percentage,
            eta,
        }
    }
}

/// Outcome of one chunk, passed to the batch-complete callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkReport {
    pub index: usize,
    pub size: usize,
    pub attempts: u32,
    /// Last store error when the chunk exhausted its retries.
    pub error: Option<String>,
}

impl ChunkReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Final result of a batch run. Partial failure is a normal outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub success: bool,
    pub total_ops: usize,
    pub completed_ops: usize,
    pub failed_ops: usize,
    pub errors: Vec<String>,
    pub elapsed: Duration,
}

impl BatchResult {
    pub fn empty(elapsed: Duration) -> Self {
        Self {
            success: true,
            total_ops: 0,
            completed_ops: 0,
            failed_ops: 0,
            errors: Vec::new(),
            elapsed,
        }
    }
}

/// Delay before a retry.
///
/// `attempt` is the 1-based retry number. Implementations must be cheap and
/// deterministic; tests inject [`NoBackoff`].
pub trait Backoff: Send + Sync + std::fmt::Debug {
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
}

/// Backoff strategy for retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed,
    /// Linear backoff: base * attempt
    Linear,
    /// Exponential backoff: base * 2^(attempt - 1)
    Exponential,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Linear
    }
}

/// Configurable backoff policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Option<Duration>,
    pub strategy: BackoffStrategy,
}

impl BackoffPolicy {
    pub fn linear(base_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay: None,
            strategy: BackoffStrategy::Linear,
        }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            max_delay: None,
            strategy: BackoffStrategy::Fixed,
        }
    }

    pub fn exponential(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay: Some(max_delay),
            strategy: BackoffStrategy::Exponential,
        }
    }
}

impl Backoff for BackoffPolicy {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay = match self.strategy {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Linear => self.base_delay.saturating_mul(attempt),
            BackoffStrategy::Exponential => {
                let factor = 2u32.saturating_pow(attempt - 1);
                self.base_delay.saturating_mul(factor)
            }
        };

        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

/// Retry immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackoff;

impl Backoff for NoBackoff {
    fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}
