//! Full and resumable batch indexing.
//!
//! A run walks the item store from a start position in batches of
//! `batch_size`. Each batch is submitted and committed together with the
//! marker `end`, the position one past its last item. The next batch is
//! enqueued as a new job carrying `end` as its start, so a run is a chain of
//! queue jobs rather than a loop or recursion.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use media_store::ItemStore;
use media_types::config::DEFAULT_BATCH_SIZE;

use crate::barrier::{CompletionCoordinator, CompletionToken};
use crate::client::IndexClient;
use crate::error::IndexingError;
use crate::marker::ProgressMarker;
use crate::queue::WorkQueue;

/// Configuration for the indexers.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Maximum items per batch
    pub batch_size: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl IndexerConfig {
    /// Set the batch size. Zero is raised to one.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }
}

/// Result of one committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Items remain after `marker`
    Continue { marker: usize },
    /// `marker` reached the item count
    Finished { marker: usize },
}

/// Indexes the whole store, resuming from a position.
#[derive(Clone)]
pub struct BatchIndexer {
    store: Arc<ItemStore>,
    client: Arc<dyn IndexClient>,
    queue: WorkQueue,
    config: IndexerConfig,
}

impl BatchIndexer {
    pub fn new(
        store: Arc<ItemStore>,
        client: Arc<dyn IndexClient>,
        queue: WorkQueue,
        config: IndexerConfig,
    ) -> Self {
        Self {
            store,
            client,
            queue,
            config,
        }
    }

    /// Start a run at `start`.
    ///
    /// The coordinator, if any, is entered before this returns and left when
    /// the run ends.
    pub fn run_from(&self, start: usize, coordinator: Option<&CompletionCoordinator>) {
        let token = coordinator.map(CompletionCoordinator::enter);
        self.continue_from(start, token);
    }

    /// Start a run with a token the caller already holds.
    pub(crate) fn continue_from(&self, start: usize, token: Option<CompletionToken>) {
        let count = self.store.count();
        let start = if start > count {
            warn!(start, count, "Start position beyond item count, clamping");
            count
        } else {
            start
        };

        info!(
            client = self.client.name(),
            start,
            count,
            batch_size = self.config.batch_size,
            "Starting indexing run"
        );
        self.schedule(start, token);
    }

    fn schedule(&self, start: usize, token: Option<CompletionToken>) {
        let job = self.clone().step(start, token);
        if !self.queue.submit(job) {
            warn!(start, "Work queue closed, abandoning indexing run");
        }
    }

    fn step(self, start: usize, token: Option<CompletionToken>) -> BoxFuture<'static, ()> {
        async move {
            match self.index_batch(start).await {
                Ok(BatchOutcome::Continue { marker }) => {
                    debug!(start, marker, "Batch committed, continuing");
                    self.schedule(marker, token);
                }
                Ok(BatchOutcome::Finished { marker }) => {
                    info!(marker, "Indexing run complete");
                    drop(token);
                }
                Err(e) => {
                    warn!(start, error = %e, "Indexing run abandoned");
                    drop(token);
                }
            }
        }
        .boxed()
    }

    /// Submit and commit the batch starting at `start`.
    ///
    /// An empty batch still commits its marker, so an empty store or a start
    /// at the end records completion.
    pub async fn index_batch(&self, start: usize) -> Result<BatchOutcome, IndexingError> {
        let count = self.store.count();
        let start = start.min(count);
        let end = start.saturating_add(self.config.batch_size).min(count);

        self.client.begin_batch().await?;

        let items = self.store.slice(start..end);
        if !items.is_empty() {
            self.client.submit_items(items).await?;
        }

        let marker = ProgressMarker::Position(end);
        self.client.end_batch(&marker.to_bytes()).await?;
        debug!(start, end, submitted = items.len(), "Committed batch");

        if end < count {
            Ok(BatchOutcome::Continue { marker: end })
        } else {
            Ok(BatchOutcome::Finished { marker: end })
        }
    }

    /// Get the item store this indexer reads from.
    pub fn store(&self) -> &Arc<ItemStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryIndexClient;
    use crate::testing::numbered_store;

    fn indexer(
        count: usize,
        batch_size: usize,
        client: &Arc<MemoryIndexClient>,
    ) -> BatchIndexer {
        BatchIndexer::new(
            Arc::new(numbered_store(count)),
            client.clone(),
            WorkQueue::spawn(),
            IndexerConfig::default().with_batch_size(batch_size),
        )
    }

    async fn run(indexer: &BatchIndexer, start: usize) {
        let coordinator = CompletionCoordinator::new();
        indexer.run_from(start, Some(&coordinator));
        coordinator.wait().await;
    }

    #[tokio::test]
    async fn test_markers_follow_batch_boundaries() {
        let client = Arc::new(MemoryIndexClient::new());
        let indexer = indexer(13, 6, &client);

        run(&indexer, 0).await;

        assert_eq!(client.committed_markers(), vec![6, 12, 13]);
        assert_eq!(client.submitted_identifiers().len(), 13);
        assert_eq!(client.document_count(), 13);
    }

    #[tokio::test]
    async fn test_exact_batch_commits_once() {
        let client = Arc::new(MemoryIndexClient::new());
        run(&indexer(6, 6, &client), 0).await;
        assert_eq!(client.committed_markers(), vec![6]);
    }

    #[tokio::test]
    async fn test_empty_store_commits_empty_batch() {
        let client = Arc::new(MemoryIndexClient::new());
        run(&indexer(0, 6, &client), 0).await;

        assert_eq!(client.committed_markers(), vec![0]);
        assert!(client.submitted_identifiers().is_empty());
    }

    #[tokio::test]
    async fn test_resume_skips_indexed_prefix() {
        let client = Arc::new(MemoryIndexClient::new());
        run(&indexer(13, 6, &client), 6).await;

        let submitted = client.submitted_identifiers();
        assert_eq!(submitted.first().map(String::as_str), Some("item-06"));
        assert_eq!(submitted.len(), 7);
        assert_eq!(client.committed_markers(), vec![12, 13]);
    }

    #[tokio::test]
    async fn test_start_beyond_count_is_clamped() {
        let client = Arc::new(MemoryIndexClient::new());
        run(&indexer(5, 6, &client), 40).await;

        assert_eq!(client.committed_markers(), vec![5]);
        assert!(client.submitted_identifiers().is_empty());
    }

    #[tokio::test]
    async fn test_commit_failure_stops_run_and_releases() {
        let client = Arc::new(MemoryIndexClient::new());
        client.fail_commits_after(1);
        let indexer = indexer(13, 6, &client);

        let coordinator = CompletionCoordinator::new();
        indexer.run_from(0, Some(&coordinator));
        coordinator.wait().await;

        assert_eq!(client.committed_markers(), vec![6]);
        assert_eq!(client.marker(), Some(ProgressMarker::Position(6)));
        assert_eq!(client.document_count(), 6);
        assert_eq!(coordinator.pending(), 0);
    }

    #[tokio::test]
    async fn test_submit_failure_leaves_marker() {
        let client = Arc::new(MemoryIndexClient::new());
        client.fail_submits_after(0);
        run(&indexer(13, 6, &client), 0).await;

        assert!(client.committed_markers().is_empty());
        assert_eq!(client.marker(), None);
    }

    #[tokio::test]
    async fn test_index_batch_outcome() {
        let client = Arc::new(MemoryIndexClient::new());
        let indexer = indexer(8, 6, &client);

        assert_eq!(
            indexer.index_batch(0).await.unwrap(),
            BatchOutcome::Continue { marker: 6 }
        );
        assert_eq!(
            indexer.index_batch(6).await.unwrap(),
            BatchOutcome::Finished { marker: 8 }
        );
    }

    #[test]
    fn test_config_batch_size() {
        assert_eq!(IndexerConfig::default().batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(IndexerConfig::default().with_batch_size(0).batch_size, 1);
    }
}
