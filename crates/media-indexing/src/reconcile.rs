//! Reconciliation of the stored marker with the item store.
//!
//! Decides whether a run is needed and where it starts: nothing stored means
//! a first full index, a marker short of the item count means resume, and
//! anything else means the index is up to date.

use std::sync::Arc;

use futures::future::FutureExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::barrier::{CompletionCoordinator, CompletionToken};
use crate::batch::BatchIndexer;
use crate::client::IndexClient;
use crate::error::IndexingError;
use crate::marker::ProgressMarker;
use crate::queue::WorkQueue;

/// What a reconciliation pass will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReconcilePlan {
    /// Marker could not be fetched; try again on the next trigger
    Skip,
    /// Index everything from position 0
    FullIndex,
    /// Continue a previous run
    Resume { from: usize },
    /// Everything is indexed
    UpToDate,
}

impl ReconcilePlan {
    /// Decide from a fetch result and the current item count.
    pub fn decide(fetched: Result<Option<Vec<u8>>, IndexingError>, count: usize) -> Self {
        let bytes = match fetched {
            Err(e) => {
                warn!(error = %e, "Could not fetch progress marker, skipping reconciliation");
                return ReconcilePlan::Skip;
            }
            Ok(None) => return ReconcilePlan::FullIndex,
            Ok(Some(bytes)) => bytes,
        };

        match ProgressMarker::from_bytes(&bytes) {
            Ok(marker) => match marker.resume_position(count) {
                Some(0) => ReconcilePlan::FullIndex,
                Some(from) => ReconcilePlan::Resume { from },
                None => ReconcilePlan::UpToDate,
            },
            Err(e) => {
                warn!(error = %e, "Undecodable progress marker, reindexing from the start");
                ReconcilePlan::FullIndex
            }
        }
    }

    /// Position a run would start from, if one is needed.
    pub fn start_position(&self) -> Option<usize> {
        match self {
            ReconcilePlan::FullIndex => Some(0),
            ReconcilePlan::Resume { from } => Some(*from),
            ReconcilePlan::Skip | ReconcilePlan::UpToDate => None,
        }
    }
}

impl std::fmt::Display for ReconcilePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcilePlan::Skip => write!(f, "skip (marker unavailable)"),
            ReconcilePlan::FullIndex => write!(f, "full index"),
            ReconcilePlan::Resume { from } => write!(f, "resume from {from}"),
            ReconcilePlan::UpToDate => write!(f, "up to date"),
        }
    }
}

/// Starts batch runs based on the stored marker.
#[derive(Clone)]
pub struct ReconciliationDriver {
    client: Arc<dyn IndexClient>,
    indexer: BatchIndexer,
    queue: WorkQueue,
}

impl ReconciliationDriver {
    pub fn new(client: Arc<dyn IndexClient>, indexer: BatchIndexer, queue: WorkQueue) -> Self {
        Self {
            client,
            indexer,
            queue,
        }
    }

    /// Fetch the marker and decide, without scheduling anything.
    pub async fn plan(&self) -> ReconcilePlan {
        let fetched = self.client.fetch_last_marker().await;
        ReconcilePlan::decide(fetched, self.indexer.store().count())
    }

    /// Reconcile on the work queue.
    ///
    /// The coordinator is entered before this returns. It is left once the
    /// resulting run ends, or right after the decision when no run is needed.
    pub fn reconcile(&self, coordinator: Option<&CompletionCoordinator>) {
        let token = coordinator.map(CompletionCoordinator::enter);
        let driver = self.clone();
        let job = async move {
            let plan = driver.plan().await;
            driver.apply(plan, token);
        }
        .boxed();

        if !self.queue.submit(job) {
            warn!("Work queue closed, skipping reconciliation");
        }
    }

    fn apply(&self, plan: ReconcilePlan, token: Option<CompletionToken>) {
        info!(plan = %plan, "Reconciling index");
        match plan.start_position() {
            Some(start) => self.indexer.continue_from(start, token),
            None => drop(token),
        }
    }
}
