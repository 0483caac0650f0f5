//! In-memory index client.
//!
//! Keeps documents and the marker in process memory and records every call.
//! Failure switches make fetches, submits, or commits fail on demand.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use media_types::Item;

use crate::client::IndexClient;
use crate::error::IndexingError;
use crate::marker::ProgressMarker;

/// One recorded call against a [`MemoryIndexClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    Fetch,
    Begin,
    /// Identifiers of a successful submit
    Submit(Vec<String>),
    /// Marker of a successful commit
    Commit(Vec<u8>),
    /// Any call that was made to fail
    Failed(&'static str),
}

#[derive(Default)]
struct MemoryState {
    documents: BTreeMap<String, Item>,
    staged: Vec<Item>,
    marker: Option<Vec<u8>>,
    in_batch: bool,
    calls: Vec<ClientCall>,
    submits: usize,
    commits: usize,
    fail_fetch: bool,
    fail_submits_after: Option<usize>,
    fail_commits_after: Option<usize>,
}

/// Index backend held entirely in memory.
#[derive(Default)]
pub struct MemoryIndexClient {
    state: Mutex<MemoryState>,
}

impl MemoryIndexClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every marker fetch fail.
    pub fn fail_fetch(&self, fail: bool) {
        self.lock().fail_fetch = fail;
    }

    /// Let `n` more submits succeed, then fail the rest.
    pub fn fail_submits_after(&self, n: usize) {
        let mut state = self.lock();
        state.fail_submits_after = Some(state.submits + n);
    }

    /// Let `n` more commits succeed, then fail the rest.
    pub fn fail_commits_after(&self, n: usize) {
        let mut state = self.lock();
        state.fail_commits_after = Some(state.commits + n);
    }

    /// Clear all failure switches.
    pub fn heal(&self) {
        let mut state = self.lock();
        state.fail_fetch = false;
        state.fail_submits_after = None;
        state.fail_commits_after = None;
    }

    /// Store marker bytes as if a previous process had committed them.
    pub fn seed_marker(&self, marker: &[u8]) {
        self.lock().marker = Some(marker.to_vec());
    }

    /// Decoded committed marker, if present and decodable.
    pub fn marker(&self) -> Option<ProgressMarker> {
        let state = self.lock();
        state
            .marker
            .as_deref()
            .and_then(|bytes| ProgressMarker::from_bytes(bytes).ok())
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<ClientCall> {
        self.lock().calls.clone()
    }

    /// Forget the recorded calls, keeping documents and marker.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Markers of successful commits, in order.
    pub fn committed_markers(&self) -> Vec<usize> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ClientCall::Commit(bytes) => match ProgressMarker::from_bytes(bytes) {
                    Ok(ProgressMarker::Position(position)) => Some(position),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    /// Identifiers of successful submits, in submission order.
    pub fn submitted_identifiers(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ClientCall::Submit(ids) => Some(ids.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Item count of each successful submit.
    pub fn submission_sizes(&self) -> Vec<usize> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ClientCall::Submit(ids) => Some(ids.len()),
                _ => None,
            })
            .collect()
    }

    /// Number of committed documents.
    pub fn document_count(&self) -> usize {
        self.lock().documents.len()
    }

    /// Committed document for an identifier.
    pub fn document(&self, identifier: &str) -> Option<Item> {
        self.lock().documents.get(identifier).cloned()
    }

    /// Identifiers of committed documents matching `query`.
    ///
    /// Every word of the query must prefix a word of the name or
    /// description, case-insensitively.
    pub fn matching_identifiers(&self, query: &str, limit: usize) -> Vec<String> {
        let terms: Vec<String> = words(query).collect();
        if terms.is_empty() {
            return Vec::new();
        }

        self.lock()
            .documents
            .values()
            .filter(|item| {
                let haystack: Vec<String> = words(&item.name)
                    .chain(item.description.as_deref().into_iter().flat_map(words))
                    .collect();
                terms
                    .iter()
                    .all(|term| haystack.iter().any(|word| word.starts_with(term.as_str())))
            })
            .take(limit)
            .map(|item| item.identifier.clone())
            .collect()
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl IndexClient for MemoryIndexClient {
    async fn fetch_last_marker(&self) -> Result<Option<Vec<u8>>, IndexingError> {
        let mut state = self.lock();
        if state.fail_fetch {
            state.calls.push(ClientCall::Failed("fetch"));
            return Err(IndexingError::Backend("marker fetch failed".to_string()));
        }
        state.calls.push(ClientCall::Fetch);
        Ok(state.marker.clone())
    }

    async fn begin_batch(&self) -> Result<(), IndexingError> {
        let mut state = self.lock();
        state.in_batch = true;
        state.staged.clear();
        state.calls.push(ClientCall::Begin);
        Ok(())
    }

    async fn submit_items(&self, items: &[Item]) -> Result<(), IndexingError> {
        let mut state = self.lock();
        if state.fail_submits_after.is_some_and(|limit| state.submits >= limit) {
            state.calls.push(ClientCall::Failed("submit"));
            state.staged.clear();
            state.in_batch = false;
            return Err(IndexingError::Backend("submit failed".to_string()));
        }

        state.submits += 1;
        let ids = items.iter().map(|item| item.identifier.clone()).collect();
        state.calls.push(ClientCall::Submit(ids));

        if state.in_batch {
            state.staged.extend(items.iter().cloned());
        } else {
            for item in items {
                state.documents.insert(item.identifier.clone(), item.clone());
            }
        }
        debug!(count = items.len(), "Submitted items to memory index");
        Ok(())
    }

    async fn end_batch(&self, marker: &[u8]) -> Result<(), IndexingError> {
        let mut state = self.lock();
        state.in_batch = false;
        let staged = std::mem::take(&mut state.staged);

        if state.fail_commits_after.is_some_and(|limit| state.commits >= limit) {
            state.calls.push(ClientCall::Failed("commit"));
            return Err(IndexingError::Backend("commit failed".to_string()));
        }

        state.commits += 1;
        for item in staged {
            state.documents.insert(item.identifier.clone(), item);
        }
        state.marker = Some(marker.to_vec());
        state.calls.push(ClientCall::Commit(marker.to_vec()));
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn item(id: &str, name: &str) -> Item {
        Item::new(id, name, Path::new("/thumbs"))
    }

    #[tokio::test]
    async fn test_batch_is_atomic() {
        let client = MemoryIndexClient::new();
        client.begin_batch().await.unwrap();
        client.submit_items(&[item("a", "Alpha")]).await.unwrap();
        assert_eq!(client.document_count(), 0);

        client.end_batch(b"1").await.unwrap();
        assert_eq!(client.document_count(), 1);
        assert_eq!(client.fetch_last_marker().await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_failed_commit_discards_batch() {
        let client = MemoryIndexClient::new();
        client.fail_commits_after(0);

        client.begin_batch().await.unwrap();
        client.submit_items(&[item("a", "Alpha")]).await.unwrap();
        assert!(client.end_batch(b"1").await.is_err());

        assert_eq!(client.document_count(), 0);
        assert!(client.fetch_last_marker().await.unwrap().is_none());
        assert_eq!(client.calls().last(), Some(&ClientCall::Failed("commit")));
    }

    #[tokio::test]
    async fn test_submit_outside_batch_is_immediate() {
        let client = MemoryIndexClient::new();
        client.seed_marker(b"4");
        client.submit_items(&[item("a", "Alpha")]).await.unwrap();

        assert_eq!(client.document_count(), 1);
        assert_eq!(client.marker(), Some(ProgressMarker::Position(4)));
    }

    #[tokio::test]
    async fn test_resubmission_keeps_one_document() {
        let client = MemoryIndexClient::new();
        client.submit_items(&[item("a", "Alpha")]).await.unwrap();
        client.submit_items(&[item("a", "Alpha v2")]).await.unwrap();

        assert_eq!(client.document_count(), 1);
        assert_eq!(client.document("a").unwrap().name, "Alpha v2");
    }

    #[tokio::test]
    async fn test_fetch_failure_and_heal() {
        let client = MemoryIndexClient::new();
        client.fail_fetch(true);
        assert!(client.fetch_last_marker().await.is_err());

        client.heal();
        assert!(client.fetch_last_marker().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_matching_identifiers() {
        let client = MemoryIndexClient::new();
        client
            .submit_items(&[
                item("harbor", "Harbor at dawn").with_description("Fishing boats"),
                item("forest", "Forest trail"),
            ])
            .await
            .unwrap();

        assert_eq!(client.matching_identifiers("harb", 10), vec!["harbor"]);
        assert_eq!(client.matching_identifiers("FISH", 10), vec!["harbor"]);
        assert!(client.matching_identifiers("harbor trail", 10).is_empty());
        assert!(client.matching_identifiers("", 10).is_empty());
    }
}
