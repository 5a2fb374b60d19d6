//! Bounded, retryable bulk writes against the document store.
//!
//! ## Design
//!
//! - Operations are split into ordered chunks below the store's per-call cap
//! - Each chunk is committed atomically, with bounded retries and backoff
//! - A chunk that exhausts its retries is a partial failure, not an abort
//! - Progress and per-chunk outcomes are reported through callbacks
//!
//! ## Components
//!
//! - `BatchOperation`: one create/update/delete against a named collection
//! - `DocumentBatchStore`: atomic multi-document commit (in-memory or remote)
//! - `BatchWriter`: chunking, retry and result aggregation
//! - `Backoff`: pluggable delay policy between retries

pub mod store;
pub mod types;
pub mod writer;

pub use store::{DocumentBatchStore, InMemoryDocumentStore, STORE_MAX_BATCH_SIZE};
pub use types::{
    Backoff, BackoffPolicy, BackoffStrategy, BatchOperation, BatchOperationKind, BatchProgress,
    BatchResult, ChunkReport, NoBackoff,
};
pub use writer::{BatchError, BatchWriter, BatchWriterConfig};
