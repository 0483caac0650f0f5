//! End-to-end test infrastructure for media-index.
//!
//! Provides a shared TestHarness and catalog helpers for tests covering
//! catalog load, indexing, resume, and query.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};

use media_indexing::MemoryIndexClient;
use media_search::{ItemSearcher, SearchIndex, SearchIndexConfig};
use media_service::{LibraryConfig, MediaLibrary};
use media_store::ItemStore;
use media_types::Settings;

/// Shared test harness for E2E tests.
///
/// Owns a temp directory holding the catalog, index, and thumbnails.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Catalog file path
    pub catalog_path: PathBuf,
    /// Tantivy index directory
    pub index_path: PathBuf,
    /// Thumbnail directory
    pub thumbnail_dir: PathBuf,
}

impl TestHarness {
    /// Create a harness with a catalog of `count` numbered records.
    pub fn new(count: usize) -> Self {
        Self::with_records(&numbered_records(count))
    }

    /// Create a harness with explicit catalog records.
    pub fn with_records(records: &[Value]) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let catalog_path = temp_dir.path().join("catalog.json");
        let index_path = temp_dir.path().join("index");
        let thumbnail_dir = temp_dir.path().join("thumbs");

        let catalog = serde_json::to_vec_pretty(&Value::Array(records.to_vec()))
            .expect("Failed to encode catalog");
        std::fs::write(&catalog_path, catalog).expect("Failed to write catalog");

        Self {
            _temp_dir: temp_dir,
            catalog_path,
            index_path,
            thumbnail_dir,
        }
    }

    /// Settings pointing at this harness.
    pub fn settings(&self, batch_size: usize) -> Settings {
        Settings {
            catalog_path: self.catalog_path.display().to_string(),
            index_path: self.index_path.display().to_string(),
            thumbnail_dir: self.thumbnail_dir.display().to_string(),
            batch_size,
            ..Settings::default()
        }
    }

    /// Load the catalog into a store.
    pub fn store(&self) -> Arc<ItemStore> {
        let (store, _report) = ItemStore::load_from_path(&self.catalog_path, &self.thumbnail_dir)
            .expect("Failed to load catalog");
        Arc::new(store)
    }

    /// Open the on-disk Tantivy index.
    pub fn search_index(&self) -> SearchIndex {
        SearchIndex::open_or_create(SearchIndexConfig::new(&self.index_path))
            .expect("Failed to open index")
    }

    /// Committed document count in the on-disk index.
    pub fn indexed_count(&self) -> u64 {
        let index = self.search_index();
        let searcher = ItemSearcher::new(&index).expect("Failed to create searcher");
        searcher.reload().expect("Failed to reload");
        searcher.num_docs()
    }
}

/// Library over the in-memory client, used as both backend and engine.
pub fn memory_library(
    store: Arc<ItemStore>,
    client: &Arc<MemoryIndexClient>,
    batch_size: usize,
    reconcile_on_start: bool,
) -> MediaLibrary {
    let mut config = LibraryConfig::default().with_reconcile_on_start(reconcile_on_start);
    config.indexer = config.indexer.with_batch_size(batch_size);
    MediaLibrary::new(store, client.clone(), client.clone(), config)
}

/// Catalog records `photo-00` .. with names `Photo 00` ..
pub fn numbered_records(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "identifier": format!("photo-{i:02}"),
                "name": format!("Photo {i:02}"),
                "rating": (i % 5) as f64,
                "description": format!("Frame {i:02} of the test roll"),
            })
        })
        .collect()
}

/// Identifiers `photo-{from}` .. `photo-{to - 1}`.
pub fn identifiers(from: usize, to: usize) -> Vec<String> {
    (from..to).map(|i| format!("photo-{i:02}")).collect()
}

/// Thumbnail location the store derives for an identifier.
pub fn expected_thumbnail(dir: &Path, identifier: &str) -> PathBuf {
    dir.join(format!("{identifier}.png"))
}
