//! Error types for the indexing engine.

use media_search::SearchError;
use thiserror::Error;

/// Errors that can occur while talking to an index backend.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Backend rejected or failed an operation
    #[error("Backend error: {0}")]
    Backend(String),

    /// Progress marker could not be encoded or decoded
    #[error("Marker error: {0}")]
    Marker(String),

    /// Tantivy search index error
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}
