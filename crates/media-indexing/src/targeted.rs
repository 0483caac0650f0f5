//! Targeted reindexing of selected identifiers.
//!
//! Scans the store in order, collecting items whose identifier was
//! requested, and submits them in batches. It never reads or writes the
//! progress marker, so it can run alongside a full run without disturbing
//! its resume point.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use media_store::ItemStore;
use media_types::Item;

use crate::barrier::{CompletionCoordinator, CompletionToken};
use crate::batch::IndexerConfig;
use crate::client::IndexClient;
use crate::queue::WorkQueue;

/// Resume state of a targeted scan, carried from job to job.
#[derive(Debug, Clone)]
struct TargetedScan {
    wanted: Arc<HashSet<String>>,
    position: usize,
    remaining: usize,
}

impl TargetedScan {
    fn is_finished(&self, count: usize) -> bool {
        self.position >= count || self.remaining == 0
    }
}

/// Reindexes a chosen set of identifiers.
#[derive(Clone)]
pub struct TargetedIndexer {
    store: Arc<ItemStore>,
    client: Arc<dyn IndexClient>,
    queue: WorkQueue,
    config: IndexerConfig,
}

impl TargetedIndexer {
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

    /// Reindex `identifiers`, scanning from `start`.
    ///
    /// Unknown identifiers are ignored. Returns how many requested
    /// identifiers exist in the store.
    pub fn run_for<I, S>(
        &self,
        identifiers: I,
        start: usize,
        coordinator: Option<&CompletionCoordinator>,
    ) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let token = coordinator.map(CompletionCoordinator::enter);

        let wanted: HashSet<String> = identifiers.into_iter().map(Into::into).collect();
        let known = wanted
            .iter()
            .filter(|identifier| {
                let found = self.store.contains(identifier);
                if !found {
                    debug!(identifier = identifier.as_str(), "Ignoring unknown identifier");
                }
                found
            })
            .count();

        let scan = TargetedScan {
            wanted: Arc::new(wanted),
            position: start.min(self.store.count()),
            remaining: known,
        };

        info!(
            requested = scan.wanted.len(),
            known,
            start = scan.position,
            "Starting targeted reindex"
        );
        self.schedule(scan, token);
        known
    }

    fn schedule(&self, scan: TargetedScan, token: Option<CompletionToken>) {
        let job = self.clone().step(scan, token);
        if !self.queue.submit(job) {
            warn!("Work queue closed, abandoning targeted reindex");
        }
    }

    fn step(self, scan: TargetedScan, token: Option<CompletionToken>) -> BoxFuture<'static, ()> {
        async move {
            let (batch, next) = self.collect_batch(scan);

            if !batch.is_empty() {
                if let Err(e) = self.client.submit_items(&batch).await {
                    warn!(error = %e, "Targeted reindex abandoned");
                    return;
                }
                debug!(submitted = batch.len(), position = next.position, "Submitted targeted batch");
            }

            if next.is_finished(self.store.count()) {
                info!("Targeted reindex complete");
                drop(token);
            } else {
                self.schedule(next, token);
            }
        }
        .boxed()
    }

    fn collect_batch(&self, mut scan: TargetedScan) -> (Vec<Item>, TargetedScan) {
        let count = self.store.count();
        let mut batch = Vec::new();

        while !scan.is_finished(count) && batch.len() < self.config.batch_size {
            let item = self.store.item_at(scan.position);
            if scan.wanted.contains(&item.identifier) {
                batch.push(item.clone());
                scan.remaining -= 1;
            }
            scan.position += 1;
        }

        (batch, scan)
    }
}
