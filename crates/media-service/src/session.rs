//! Cancellable search sessions.
//!
//! A session runs at most one live query. Starting a new query cancels the
//! previous one, and a cancelled query yields no further events.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use media_store::ItemStore;
use media_types::Item;

use crate::engine::QueryEngine;

/// Limits applied to every query of a session.
#[derive(Debug, Clone, Copy)]
pub struct QueryConfig {
    /// Maximum identifiers requested from the engine
    pub limit: usize,
    /// Items per `Found` event
    pub page_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            page_size: 10,
        }
    }
}

/// Event delivered by an [`ActiveQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    /// A page of matches in engine order
    Found(Vec<Item>),
    /// All matches, sorted by display name then identifier
    Completed(Vec<Item>),
}

/// Issues queries, cancelling the previous one each time.
pub struct SearchSession {
    engine: Arc<dyn QueryEngine>,
    store: Arc<ItemStore>,
    config: QueryConfig,
    current: Mutex<Option<CancellationToken>>,
}

impl SearchSession {
    pub fn new(engine: Arc<dyn QueryEngine>, store: Arc<ItemStore>, config: QueryConfig) -> Self {
        Self {
            engine,
            store,
            config,
            current: Mutex::new(None),
        }
    }

    /// Start a query, cancelling the one before it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn search(&self, text: &str) -> ActiveQuery {
        let cancel = CancellationToken::new();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(cancel.clone());
        if let Some(previous) = previous {
            previous.cancel();
            debug!("Cancelled previous query");
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let task = QueryTask {
            engine: self.engine.clone(),
            store: self.store.clone(),
            config: self.config,
            text: text.to_string(),
            cancel: cancel.clone(),
            events: events_tx,
        };
        tokio::spawn(task.run());

        ActiveQuery {
            events: events_rx,
            cancel,
        }
    }
}

struct QueryTask {
    engine: Arc<dyn QueryEngine>,
    store: Arc<ItemStore>,
    config: QueryConfig,
    text: String,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<QueryEvent>,
}

impl QueryTask {
    async fn run(self) {
        if self.text.trim().is_empty() {
            self.emit(QueryEvent::Completed(Vec::new()));
            return;
        }

        let resolved = tokio::select! {
            _ = self.cancel.cancelled() => return,
            resolved = self.engine.matching_identifiers(&self.text, self.config.limit) => resolved,
        };
        let identifiers = match resolved {
            Ok(identifiers) => identifiers,
            Err(e) => {
                warn!(query = %self.text, error = %e, "Query failed");
                self.emit(QueryEvent::Completed(Vec::new()));
                return;
            }
        };

        let mut items: Vec<Item> = identifiers
            .iter()
            .filter_map(|identifier| self.store.find(identifier).cloned())
            .collect();

        for page in items.chunks(self.config.page_size.max(1)) {
            if !self.emit(QueryEvent::Found(page.to_vec())) {
                return;
            }
        }

        items.sort_by(Item::display_cmp);
        debug!(query = %self.text, results = items.len(), "Query complete");
        self.emit(QueryEvent::Completed(items));
    }

    /// Send an event unless cancelled. Returns whether the query is live.
    fn emit(&self, event: QueryEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.events.send(event).is_ok()
    }
}

/// Handle to a running query.
///
/// Dropping the handle cancels the query.
pub struct ActiveQuery {
    events: mpsc::UnboundedReceiver<QueryEvent>,
    cancel: CancellationToken,
}

impl ActiveQuery {
    /// Next event, or `None` once the query is finished or cancelled.
    pub async fn next_event(&mut self) -> Option<QueryEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.events.recv() => event.filter(|_| !self.cancel.is_cancelled()),
        }
    }

    /// Drain the query and return its sorted results.
    ///
    /// Returns `None` if the query was cancelled first.
    pub async fn completed(mut self) -> Option<Vec<Item>> {
        while let Some(event) = self.next_event().await {
            if let QueryEvent::Completed(items) = event {
                return Some(items);
            }
        }
        None
    }

    /// Cancel this query.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for ActiveQuery {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use async_trait::async_trait;
    use media_indexing::{IndexClient, MemoryIndexClient};
    use media_search::SearchError;
    use std::path::Path;
    use tokio::sync::Notify;

    fn store() -> Arc<ItemStore> {
        let thumbs = Path::new("/thumbs");
        Arc::new(ItemStore::from_items([
            Item::new("c", "Beach", thumbs),
            Item::new("a", "Beach", thumbs),
            Item::new("b", "Avenue", thumbs).with_description("Beach road"),
            Item::new("d", "Mountain", thumbs),
        ]))
    }

    async fn memory_engine(store: &ItemStore) -> Arc<MemoryIndexClient> {
        let client = Arc::new(MemoryIndexClient::new());
        let items: Vec<Item> = store.iter().cloned().collect();
        client.submit_items(&items).await.unwrap();
        client
    }

    /// Engine that blocks until released, to hold a query in flight.
    struct GatedEngine {
        gate: Notify,
    }

    #[async_trait]
    impl QueryEngine for GatedEngine {
        async fn matching_identifiers(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<String>, ServiceError> {
            self.gate.notified().await;
            Ok(vec!["a".to_string()])
        }
    }

    struct FailingEngine;

    #[async_trait]
    impl QueryEngine for FailingEngine {
        async fn matching_identifiers(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<String>, ServiceError> {
            Err(SearchError::IndexLocked("engine offline".to_string()).into())
        }
    }

    #[tokio::test]
    async fn test_pages_then_sorted_completion() {
        let store = store();
        let engine = memory_engine(&store).await;
        let session = SearchSession::new(
            engine,
            store,
            QueryConfig {
                limit: 100,
                page_size: 2,
            },
        );

        let mut query = session.search("beach");
        let mut pages = Vec::new();
        let completed = loop {
            match query.next_event().await {
                Some(QueryEvent::Found(page)) => pages.push(page.len()),
                Some(QueryEvent::Completed(items)) => break items,
                None => panic!("query ended without completion"),
            }
        };

        assert_eq!(pages, vec![2, 1]);
        let ids: Vec<&str> = completed.iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(query.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_query_completes_empty() {
        let store = store();
        let session = SearchSession::new(memory_engine(&store).await, store, QueryConfig::default());

        let mut query = session.search("   ");
        assert_eq!(query.next_event().await, Some(QueryEvent::Completed(Vec::new())));
    }

    #[tokio::test]
    async fn test_engine_failure_completes_empty() {
        let session = SearchSession::new(Arc::new(FailingEngine), store(), QueryConfig::default());
        assert_eq!(session.search("beach").completed().await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_new_query_cancels_previous() {
        let engine = Arc::new(GatedEngine {
            gate: Notify::new(),
        });
        let session = SearchSession::new(engine.clone(), store(), QueryConfig::default());

        let mut first = session.search("beach");
        tokio::task::yield_now().await;
        let second = session.search("beach");

        assert!(first.is_cancelled());
        engine.gate.notify_waiters();
        assert!(first.next_event().await.is_none());

        engine.gate.notify_one();
        let items = second.completed().await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_cancel() {
        let store = store();
        let session = SearchSession::new(memory_engine(&store).await, store, QueryConfig::default());

        let mut query = session.search("beach");
        query.cancel();
        assert!(query.next_event().await.is_none());
    }
}
