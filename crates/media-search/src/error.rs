//! Search error types.

use thiserror::Error;

/// Errors that can occur during index and search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Writer mutex was poisoned by a panicking holder
    #[error("Index is locked: {0}")]
    IndexLocked(String),
}
