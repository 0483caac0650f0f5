//! # media-search
//!
//! Full-text item search for media-index using Tantivy.
//!
//! ## Features
//! - Embedded Tantivy index (MmapDirectory on disk, or RAM for tests)
//! - Upsert-by-identifier, so resubmitting an item is idempotent
//! - Commit payloads carry the indexer's progress marker, making
//!   "documents + marker" a single atomic commit
//! - Prefix matching over item name and description

pub mod document;
pub mod error;
pub mod index;
pub mod indexer;
pub mod schema;
pub mod searcher;

pub use document::item_to_doc;
pub use error::SearchError;
pub use index::{open_or_create_index, SearchIndex, SearchIndexConfig};
pub use indexer::ItemIndexer;
pub use schema::{build_item_schema, ItemSchema};
pub use searcher::{ItemSearcher, SearchHit};
