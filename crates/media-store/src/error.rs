//! Store error types.

use thiserror::Error;

/// Errors that abort a catalog load as a whole.
///
/// Individual bad records never produce one of these; they are skipped.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Catalog file could not be read
    #[error("IO error reading catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Catalog is not valid JSON
    #[error("Catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog root is not an array of records
    #[error("Catalog root must be a JSON array, got {0}")]
    NotAnArray(&'static str),
}
