//! Ordered in-memory item store.

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use media_types::{parse_records, Item, RecordOutcome, SkipReason};

use crate::error::StoreError;

/// Summary of a catalog load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Records that became items
    pub loaded: usize,
    /// Records that were dropped, with their catalog position
    pub skipped: Vec<(usize, SkipReason)>,
}

/// Read-only, ordered collection of items.
///
/// Insertion order is catalog order and never changes after load, so a
/// position handed out as a resume offset stays valid for the process
/// lifetime. Share it behind an `Arc`; no lock is needed.
#[derive(Debug, Default)]
pub struct ItemStore {
    items: Vec<Item>,
    positions: HashMap<String, usize>,
}

impl ItemStore {
    /// Build a store from already-validated items.
    ///
    /// Later duplicates of an identifier are dropped.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut store = Self::default();
        for item in items {
            if let Err(reason) = store.push(item) {
                debug!(%reason, "Dropping item");
            }
        }
        store
    }

    /// Load catalog records, skipping malformed ones.
    pub fn load(records: &[Value], thumbnail_dir: &Path) -> (Self, LoadReport) {
        let mut store = Self::default();
        let mut report = LoadReport::default();

        for outcome in parse_records(records, thumbnail_dir) {
            match outcome {
                RecordOutcome::Item(item) => match store.push(item) {
                    Ok(()) => report.loaded += 1,
                    Err(reason) => {
                        let position = report.loaded + report.skipped.len();
                        debug!(position, %reason, "Skipping catalog record");
                        report.skipped.push((position, reason));
                    }
                },
                RecordOutcome::Skipped { position, reason } => {
                    debug!(position, %reason, "Skipping catalog record");
                    report.skipped.push((position, reason));
                }
            }
        }

        info!(
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "Loaded catalog"
        );
        (store, report)
    }

    /// Read and load a JSON catalog file.
    pub fn load_from_path(
        path: &Path,
        thumbnail_dir: &Path,
    ) -> Result<(Self, LoadReport), StoreError> {
        let bytes = std::fs::read(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let root: Value = serde_json::from_slice(&bytes)?;

        let records = match &root {
            Value::Array(records) => records,
            Value::Object(_) => return Err(StoreError::NotAnArray("object")),
            Value::String(_) => return Err(StoreError::NotAnArray("string")),
            Value::Number(_) => return Err(StoreError::NotAnArray("number")),
            Value::Bool(_) => return Err(StoreError::NotAnArray("bool")),
            Value::Null => return Err(StoreError::NotAnArray("null")),
        };

        Ok(Self::load(records, thumbnail_dir))
    }

    fn push(&mut self, item: Item) -> Result<(), SkipReason> {
        if self.positions.contains_key(&item.identifier) {
            return Err(SkipReason::DuplicateIdentifier(item.identifier));
        }
        self.positions
            .insert(item.identifier.clone(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    /// Number of items.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position >= count()`; callers derive positions from the
    /// store itself, so an out-of-range value is a logic error.
    pub fn item_at(&self, position: usize) -> &Item {
        assert!(
            position < self.items.len(),
            "item position {position} out of range (count {})",
            self.items.len()
        );
        &self.items[position]
    }

    /// Items in `range`, clamped to the store size.
    pub fn slice(&self, range: Range<usize>) -> &[Item] {
        let end = range.end.min(self.items.len());
        let start = range.start.min(end);
        &self.items[start..end]
    }

    /// Find an item by identifier. A miss is a normal outcome.
    pub fn find(&self, identifier: &str) -> Option<&Item> {
        self.positions
            .get(identifier)
            .map(|&position| &self.items[position])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.positions.contains_key(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }
}
