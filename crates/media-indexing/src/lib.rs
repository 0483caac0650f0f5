//! # media-indexing
//!
//! Incremental, resumable batch indexing of the item store.
//!
//! ## Components
//! - [`IndexClient`]: backend trait (marker fetch, batch scope, submit)
//! - [`BatchIndexer`]: full runs resuming from the stored marker
//! - [`TargetedIndexer`]: reindex selected identifiers, marker untouched
//! - [`ReconciliationDriver`]: decide between first index, resume, or no-op
//! - [`CompletionCoordinator`]: join barrier over concurrent runs
//! - [`WorkQueue`]: the single background worker every step runs on
//!
//! Two backends are provided: [`SearchIndexClient`] over Tantivy and
//! [`MemoryIndexClient`] held in memory.

pub mod barrier;
pub mod batch;
pub mod client;
pub mod error;
pub mod marker;
pub mod memory;
pub mod queue;
pub mod reconcile;
pub mod tantivy_client;
pub mod targeted;

#[cfg(test)]
pub(crate) mod testing;

pub use barrier::{CompletionCoordinator, CompletionToken};
pub use batch::{BatchIndexer, BatchOutcome, IndexerConfig};
pub use client::IndexClient;
pub use error::IndexingError;
pub use marker::ProgressMarker;
pub use memory::{ClientCall, MemoryIndexClient};
pub use queue::{Job, WorkQueue};
pub use reconcile::{ReconcilePlan, ReconciliationDriver};
pub use tantivy_client::SearchIndexClient;
pub use targeted::TargetedIndexer;
