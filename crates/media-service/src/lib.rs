//! # media-service
//!
//! The caller-facing media library.
//!
//! [`MediaLibrary`] owns the item store, the index backend, the work queue,
//! and the indexers. It exposes full and targeted reindexing with completion
//! handlers, lookups, and [`SearchSession`]s whose queries cancel one
//! another.

pub mod engine;
pub mod error;
pub mod library;
pub mod session;

pub use engine::QueryEngine;
pub use error::ServiceError;
pub use library::{load_catalog, LibraryConfig, LibraryStatus, MediaLibrary};
pub use session::{ActiveQuery, QueryConfig, QueryEvent, SearchSession};
