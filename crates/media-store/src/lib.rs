//! Item store for media-index.
//!
//! Holds the catalog's items in catalog order for the lifetime of the
//! process. Positions are stable, which is what makes them usable as
//! resume offsets for incremental indexing.

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{ItemStore, LoadReport};
