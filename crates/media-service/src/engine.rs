//! Query engines resolving user text to item identifiers.

use async_trait::async_trait;

use media_indexing::MemoryIndexClient;
use media_search::ItemSearcher;

use crate::error::ServiceError;

/// Resolves a query to matching identifiers.
///
/// Ranking and matching belong to the engine; the service only orders the
/// final result set for display.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn matching_identifiers(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, ServiceError>;
}

#[async_trait]
impl QueryEngine for ItemSearcher {
    async fn matching_identifiers(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, ServiceError> {
        self.reload()?;
        let hits = self.search(query, limit)?;
        Ok(hits.into_iter().map(|hit| hit.identifier).collect())
    }
}

#[async_trait]
impl QueryEngine for MemoryIndexClient {
    async fn matching_identifiers(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, ServiceError> {
        Ok(MemoryIndexClient::matching_identifiers(self, query, limit))
    }
}
