//! Chunked batch writer with per-chunk retry and progress reporting.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::store::DocumentBatchStore;
use super::types::{Backoff, BackoffPolicy, BatchOperation, BatchProgress, BatchResult, ChunkReport};
use crate::config::{parse_or, process_env};
use crate::store::StoreError;

/// Called with cumulative progress after every chunk.
pub type ProgressCallback = Arc<dyn Fn(&BatchProgress) + Send + Sync>;

/// Called with the outcome of every chunk.
pub type BatchCompleteCallback = Arc<dyn Fn(&ChunkReport) + Send + Sync>;

pub const DEFAULT_CHUNK_SIZE: usize = 450;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Batch writer configuration.
#[derive(Clone)]
pub struct BatchWriterConfig {
    /// Operations per store call; kept below the store's hard limit.
    pub chunk_size: usize,
    /// Retries per chunk after the first attempt.
    pub max_retries: u32,
    /// Base delay for the default linear backoff.
    pub retry_base_delay: Duration,
    pub on_progress: Option<ProgressCallback>,
    pub on_batch_complete: Option<BatchCompleteCallback>,
}

impl Default for BatchWriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            on_progress: None,
            on_batch_complete: None,
        }
    }
}

impl std::fmt::Debug for BatchWriterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriterConfig")
            .field("chunk_size", &self.chunk_size)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_batch_complete", &self.on_batch_complete.is_some())
            .finish()
    }
}

impl BatchWriterConfig {
    /// Load from `STOCKPOOL_BATCH_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let delay_ms = parse_or(
            &lookup,
            "STOCKPOOL_BATCH_RETRY_BASE_DELAY_MS",
            defaults.retry_base_delay.as_millis() as u64,
        );
        Self {
            chunk_size: parse_or(&lookup, "STOCKPOOL_BATCH_CHUNK_SIZE", defaults.chunk_size),
            max_retries: parse_or(&lookup, "STOCKPOOL_BATCH_MAX_RETRIES", defaults.max_retries),
            retry_base_delay: Duration::from_millis(delay_ms),
            ..defaults
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BatchProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn on_batch_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ChunkReport) + Send + Sync + 'static,
    {
        self.on_batch_complete = Some(Arc::new(callback));
        self
    }

    fn validate(&self, store_limit: usize) -> Result<(), BatchError> {
        if self.chunk_size == 0 {
            return Err(BatchError::InvalidConfig("chunk_size must be positive".to_string()));
        }
        if self.chunk_size > store_limit {
            return Err(BatchError::InvalidConfig(format!(
                "chunk_size {} exceeds store limit {store_limit}",
                self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Orchestration-level failure. Chunk failures are reported in [`BatchResult`].
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid batch configuration: {0}")]
    InvalidConfig(String),

    #[error("store unavailable before batch start: {0}")]
    StoreUnavailable(#[source] StoreError),
}

/// Splits operations into store-safe chunks and commits them one at a time.
///
/// Knows nothing about what the operations mean.
#[derive(Debug)]
pub struct BatchWriter<S: DocumentBatchStore> {
    store: S,
    backoff: Option<Arc<dyn Backoff>>,
}

impl<S: DocumentBatchStore> BatchWriter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            backoff: None,
        }
    }

    /// Override the default linear backoff (`retry_base_delay * attempt`).
    pub fn with_backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write all operations, in order, in chunks of `config.chunk_size`.
    ///
    /// Returns `Err` only when the run cannot start. A chunk that exhausts its
    /// retries is counted in `failed_ops` and the run moves on.
    pub async fn execute(
        &self,
        operations: Vec<BatchOperation>,
        config: &BatchWriterConfig,
    ) -> Result<BatchResult, BatchError> {
        let started = Instant::now();
        let total_ops = operations.len();
        if total_ops == 0 {
            return Ok(BatchResult::empty(started.elapsed()));
        }

        config.validate(self.store.max_batch_size())?;
        self.store
            .health_check()
            .await
            .map_err(BatchError::StoreUnavailable)?;

        let backoff: Arc<dyn Backoff> = match &self.backoff {
            Some(b) => b.clone(),
            None => Arc::new(BackoffPolicy::linear(config.retry_base_delay)),
        };

        let total_batches = total_ops.div_ceil(config.chunk_size);
        info!(total_ops, total_batches, chunk_size = config.chunk_size, "batch write started");

        let mut completed_ops = 0usize;
        let mut failed_ops = 0usize;
        let mut errors = Vec::new();

        for (index, chunk) in operations.chunks(config.chunk_size).enumerate() {
            let (attempts, outcome) = self
                .commit_with_retry(chunk, config.max_retries, backoff.as_ref(), index)
                .await;

            let error = match outcome {
                Ok(()) => {
                    completed_ops += chunk.len();
                    debug!(batch = index + 1, total_batches, attempts, "batch committed");
                    None
                }
                Err(err) => {
                    failed_ops += chunk.len();
                    warn!(
                        batch = index + 1,
                        total_batches,
                        attempts,
                        error = %err,
                        "batch failed after retries"
                    );
                    errors.push(format!(
                        "batch {}/{total_batches} failed after {attempts} attempts: {err}",
                        index + 1
                    ));
                    Some(err.to_string())
                }
            };

            if let Some(cb) = &config.on_batch_complete {
                cb(&ChunkReport {
                    index,
                    size: chunk.len(),
                    attempts,
                    error,
                });
            }

            if let Some(cb) = &config.on_progress {
                cb(&BatchProgress::compute(
                    total_ops,
                    completed_ops,
                    failed_ops,
                    index,
                    total_batches,
                    started.elapsed(),
                ));
            }
        }

        let elapsed = started.elapsed();
        info!(
            total_ops,
            completed_ops,
            failed_ops,
            elapsed_ms = elapsed.as_millis() as u64,
            "batch write finished"
        );

        Ok(BatchResult {
            success: errors.is_empty(),
            total_ops,
            completed_ops,
            failed_ops,
            errors,
            elapsed,
        })
    }

    async fn commit_with_retry(
        &self,
        chunk: &[BatchOperation],
        max_retries: u32,
        backoff: &dyn Backoff,
        index: usize,
    ) -> (u32, Result<(), StoreError>) {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.store.commit(chunk).await {
                Ok(()) => return (attempt, Ok(())),
                Err(err) => {
                    let retry = attempt;
                    if retry > max_retries {
                        return (attempt, Err(err));
                    }
                    let delay = backoff.delay_for_attempt(retry);
                    debug!(
                        batch = index + 1,
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "batch commit failed; retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}
