//! Service error types.

use media_search::SearchError;
use media_store::StoreError;
use media_types::MediaError;
use thiserror::Error;

/// Errors surfaced by the media library.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Catalog could not be loaded
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Search index error
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Invalid settings
    #[error("Configuration error: {0}")]
    Config(#[from] MediaError),
}
