//! Index client trait for the search index backend.
//!
//! Every indexer talks to its backend through this trait. Implementations
//! must upsert by identifier so a resubmitted item leaves one document.

use async_trait::async_trait;

use media_types::Item;

use crate::error::IndexingError;

/// Backend operations used by the indexing engine.
///
/// A batch scope is `begin_batch`, any number of `submit_items`, then
/// `end_batch`. Durability of the scope's items and of the marker happens
/// together at `end_batch`. Items submitted outside a scope are made durable
/// by the backend on its own, without touching the stored marker.
#[async_trait]
pub trait IndexClient: Send + Sync {
    /// Fetch the marker stored by the last committed batch.
    ///
    /// `Ok(None)` means the backend has never committed a marker.
    async fn fetch_last_marker(&self) -> Result<Option<Vec<u8>>, IndexingError>;

    /// Open a batch scope.
    async fn begin_batch(&self) -> Result<(), IndexingError>;

    /// Submit items for indexing.
    async fn submit_items(&self, items: &[Item]) -> Result<(), IndexingError>;

    /// Close the batch scope, committing its items together with `marker`.
    async fn end_batch(&self, marker: &[u8]) -> Result<(), IndexingError>;

    /// Get the name of this client for logging.
    fn name(&self) -> &str;
}
