//! Index client backed by the Tantivy item index.
//!
//! The progress marker travels as the Tantivy commit payload, so the
//! documents of a batch and its marker become durable in one commit.
//!
//! Tantivy allows one writer per index directory. The client takes it on
//! the first write, so a client that only reads the marker never contends
//! with a process that is indexing.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use media_search::{ItemIndexer, SearchIndex};
use media_types::Item;

use crate::client::IndexClient;
use crate::error::IndexingError;

/// [`IndexClient`] over a [`SearchIndex`].
pub struct SearchIndexClient {
    index: SearchIndex,
    indexer: OnceCell<ItemIndexer>,
    in_batch: AtomicBool,
}

impl SearchIndexClient {
    pub fn new(index: &SearchIndex) -> Self {
        Self {
            index: index.clone(),
            indexer: OnceCell::new(),
            in_batch: AtomicBool::new(false),
        }
    }

    /// Whether this client has taken the index writer.
    pub fn holds_writer(&self) -> bool {
        self.indexer.initialized()
    }

    async fn indexer(&self) -> Result<&ItemIndexer, IndexingError> {
        self.indexer
            .get_or_try_init(|| async {
                let indexer = ItemIndexer::new(&self.index)?;
                info!(path = ?self.index.path(), "Acquired index writer");
                Ok::<_, IndexingError>(indexer)
            })
            .await
    }
}

#[async_trait]
impl IndexClient for SearchIndexClient {
    async fn fetch_last_marker(&self) -> Result<Option<Vec<u8>>, IndexingError> {
        let payload = self.index.stored_payload()?;
        Ok(payload.map(String::into_bytes))
    }

    async fn begin_batch(&self) -> Result<(), IndexingError> {
        self.in_batch.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn submit_items(&self, items: &[Item]) -> Result<(), IndexingError> {
        let in_batch = self.in_batch.load(Ordering::SeqCst);
        let indexer = match self.indexer().await {
            Ok(indexer) => indexer,
            Err(e) => {
                self.in_batch.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        if let Err(e) = indexer.upsert_items(items) {
            if in_batch {
                self.in_batch.store(false, Ordering::SeqCst);
                if let Err(rollback) = indexer.rollback() {
                    warn!(error = %rollback, "Rollback after failed submit also failed");
                }
            }
            return Err(e.into());
        }

        if !in_batch {
            indexer.commit_preserving_payload()?;
            debug!(count = items.len(), "Committed items outside batch");
        }
        Ok(())
    }

    async fn end_batch(&self, marker: &[u8]) -> Result<(), IndexingError> {
        self.in_batch.store(false, Ordering::SeqCst);
        let indexer = self.indexer().await?;

        let payload = match std::str::from_utf8(marker) {
            Ok(payload) => payload,
            Err(e) => {
                indexer.rollback()?;
                return Err(IndexingError::Marker(format!("marker is not UTF-8: {e}")));
            }
        };
        indexer.commit_with_payload(payload)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "tantivy"
    }
}
