//! The media library: owner of the store, index client, and indexers.
//!
//! Construction starts the initial reconciliation. Callers trigger further
//! indexing through [`MediaLibrary::reindex_all`] and
//! [`MediaLibrary::reindex_identifiers`], and read through lookups and
//! search sessions. Completion handlers run on the runtime's blocking pool,
//! never on the indexing queue.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use media_indexing::{
    BatchIndexer, CompletionCoordinator, IndexClient, IndexerConfig, ReconcilePlan,
    ReconciliationDriver, SearchIndexClient, TargetedIndexer, WorkQueue,
};
use media_search::{ItemSearcher, SearchIndex, SearchIndexConfig};
use media_store::ItemStore;
use media_types::{Item, Settings};

use crate::engine::QueryEngine;
use crate::error::ServiceError;
use crate::session::{QueryConfig, SearchSession};

/// Tunables for a library.
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub indexer: IndexerConfig,
    pub query: QueryConfig,
    /// Reconcile as soon as the library is constructed
    pub reconcile_on_start: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            indexer: IndexerConfig::default(),
            query: QueryConfig::default(),
            reconcile_on_start: true,
        }
    }
}

impl LibraryConfig {
    pub fn with_reconcile_on_start(mut self, reconcile: bool) -> Self {
        self.reconcile_on_start = reconcile;
        self
    }
}

impl From<&Settings> for LibraryConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            indexer: IndexerConfig::default().with_batch_size(settings.batch_size),
            query: QueryConfig {
                limit: settings.search_limit,
                page_size: settings.search_page_size,
            },
            reconcile_on_start: true,
        }
    }
}

/// Snapshot of indexing progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryStatus {
    /// Items in the store
    pub item_count: usize,
    /// Stored marker as text, if one could be fetched
    pub marker: Option<String>,
    /// What reconciliation would do now
    pub plan: ReconcilePlan,
}

/// Top-level owner wiring store, backend, queue, indexers, and queries.
pub struct MediaLibrary {
    store: Arc<ItemStore>,
    client: Arc<dyn IndexClient>,
    engine: Arc<dyn QueryEngine>,
    queue: WorkQueue,
    targeted: TargetedIndexer,
    driver: ReconciliationDriver,
    startup: CompletionCoordinator,
    config: LibraryConfig,
    runtime: Handle,
}

/// Load the catalog named by `settings`, logging skipped records.
pub fn load_catalog(settings: &Settings) -> Result<ItemStore, ServiceError> {
    let (store, report) =
        ItemStore::load_from_path(&settings.catalog_path(), &settings.thumbnail_dir())?;
    if !report.skipped.is_empty() {
        warn!(skipped = report.skipped.len(), "Some catalog records were skipped");
    }
    Ok(store)
}

impl MediaLibrary {
    /// Wire a library and, unless disabled, start the initial
    /// reconciliation.
    ///
    /// Must be called from within a tokio runtime; the work queue is spawned
    /// on it.
    pub fn new(
        store: Arc<ItemStore>,
        client: Arc<dyn IndexClient>,
        engine: Arc<dyn QueryEngine>,
        config: LibraryConfig,
    ) -> Self {
        let queue = WorkQueue::spawn();
        let batch = BatchIndexer::new(
            store.clone(),
            client.clone(),
            queue.clone(),
            config.indexer.clone(),
        );
        let targeted = TargetedIndexer::new(
            store.clone(),
            client.clone(),
            queue.clone(),
            config.indexer.clone(),
        );
        let driver = ReconciliationDriver::new(client.clone(), batch, queue.clone());

        let startup = CompletionCoordinator::new();
        if config.reconcile_on_start {
            driver.reconcile(Some(&startup));
        }

        info!(
            items = store.count(),
            client = client.name(),
            "Media library started"
        );

        Self {
            store,
            client,
            engine,
            queue,
            targeted,
            driver,
            startup,
            config,
            runtime: Handle::current(),
        }
    }

    /// Open the catalog and Tantivy index named by `settings`.
    pub fn open(settings: &Settings) -> Result<Self, ServiceError> {
        Self::open_with(settings, LibraryConfig::from(settings))
    }

    /// Like [`MediaLibrary::open`] with explicit tunables.
    pub fn open_with(settings: &Settings, config: LibraryConfig) -> Result<Self, ServiceError> {
        settings.validate()?;
        let store = load_catalog(settings)?;

        let index = SearchIndex::open_or_create(
            SearchIndexConfig::new(settings.index_path()).with_memory_mb(settings.writer_memory_mb),
        )?;
        let client = SearchIndexClient::new(&index);
        let searcher = ItemSearcher::new(&index)?;

        Ok(Self::new(
            Arc::new(store),
            Arc::new(client),
            Arc::new(searcher),
            config,
        ))
    }

    /// Wait for the reconciliation started by construction.
    pub async fn wait_for_startup(&self) {
        self.startup.wait().await;
    }

    /// Hand `handler` to the blocking pool when the coordinator fires.
    fn dispatch(
        &self,
        coordinator: &CompletionCoordinator,
        handler: impl FnOnce() + Send + 'static,
    ) {
        let runtime = self.runtime.clone();
        coordinator.on_complete(move || {
            debug!("Dispatching completion handler");
            drop(runtime.spawn_blocking(handler));
        });
    }

    /// Reconcile and index whatever is missing; `handler` runs when done.
    pub fn reindex_all(&self, handler: impl FnOnce() + Send + 'static) {
        let coordinator = CompletionCoordinator::new();
        self.driver.reconcile(Some(&coordinator));
        self.dispatch(&coordinator, handler);
    }

    /// Reconcile and wait until the resulting run has ended.
    pub async fn reindex_all_and_wait(&self) {
        let coordinator = CompletionCoordinator::new();
        self.driver.reconcile(Some(&coordinator));
        coordinator.wait().await;
    }

    /// Reindex the given identifiers; `handler` runs when done.
    ///
    /// Returns how many of the identifiers exist in the store.
    pub fn reindex_identifiers<I, S>(
        &self,
        identifiers: I,
        handler: impl FnOnce() + Send + 'static,
    ) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let coordinator = CompletionCoordinator::new();
        let known = self.targeted.run_for(identifiers, 0, Some(&coordinator));
        self.dispatch(&coordinator, handler);
        known
    }

    /// Reindex the given identifiers and wait for the run to end.
    pub async fn reindex_identifiers_and_wait<I, S>(&self, identifiers: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let coordinator = CompletionCoordinator::new();
        let known = self.targeted.run_for(identifiers, 0, Some(&coordinator));
        coordinator.wait().await;
        known
    }

    /// Find an item by identifier.
    pub fn lookup(&self, identifier: &str) -> Option<&Item> {
        self.store.find(identifier)
    }

    /// Data provided for an item: its description as UTF-8 bytes.
    pub fn item_data(&self, identifier: &str) -> Option<Vec<u8>> {
        self.lookup(identifier).map(|item| {
            item.description
                .as_deref()
                .unwrap_or_default()
                .as_bytes()
                .to_vec()
        })
    }

    /// Derived thumbnail location for an item.
    pub fn thumbnail_path(&self, identifier: &str) -> Option<&Path> {
        self.lookup(identifier)
            .map(|item| item.thumbnail_path.as_path())
    }

    /// Fetch the marker and report what reconciliation would do.
    pub async fn status(&self) -> LibraryStatus {
        let fetched = self.client.fetch_last_marker().await;
        let marker = match &fetched {
            Ok(Some(bytes)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        };
        LibraryStatus {
            item_count: self.store.count(),
            marker,
            plan: ReconcilePlan::decide(fetched, self.store.count()),
        }
    }

    /// Open a search session over this library.
    pub fn search_session(&self) -> SearchSession {
        SearchSession::new(self.engine.clone(), self.store.clone(), self.config.query)
    }

    pub fn store(&self) -> &Arc<ItemStore> {
        &self.store
    }

    /// Stop the work queue. Runs still queued are dropped and release
    /// their waiters.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }
}
