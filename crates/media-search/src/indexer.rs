//! Item indexer for adding documents to the Tantivy index.
//!
//! The indexer wraps IndexWriter with shared access via Arc<Mutex>.
//! Documents are not visible until one of the commit methods is called.

use std::sync::{Arc, Mutex, MutexGuard};

use tantivy::{Index, IndexWriter, Term};
use tracing::{debug, info};

use media_types::Item;

use crate::document::item_to_doc;
use crate::error::SearchError;
use crate::index::{stored_payload, SearchIndex};
use crate::schema::ItemSchema;

/// Manages item indexing operations.
///
/// Every add is an upsert keyed on the item identifier.
pub struct ItemIndexer {
    writer: Arc<Mutex<IndexWriter>>,
    index: Index,
    schema: ItemSchema,
}

impl ItemIndexer {
    /// Create a new indexer from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        let writer = index.writer()?;

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            index: index.index().clone(),
            schema: index.schema().clone(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, IndexWriter>, SearchError> {
        self.writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))
    }

    /// Index multiple items.
    ///
    /// Existing documents with the same identifier are replaced.
    pub fn upsert_items(&self, items: &[Item]) -> Result<usize, SearchError> {
        let writer = self.lock()?;

        let mut count = 0;
        for item in items {
            let term = Term::from_field_text(self.schema.identifier, &item.identifier);
            writer.delete_term(term);
            writer.add_document(item_to_doc(&self.schema, item))?;
            count += 1;
        }

        debug!(count, "Indexed items batch");
        Ok(count)
    }

    /// Commit pending documents together with a payload.
    ///
    /// Documents and payload become durable in the same commit.
    pub fn commit_with_payload(&self, payload: &str) -> Result<u64, SearchError> {
        let mut writer = self.lock()?;
        let mut prepared = writer.prepare_commit()?;
        prepared.set_payload(payload);
        let opstamp = prepared.commit()?;
        info!(opstamp, payload, "Committed index with payload");
        Ok(opstamp)
    }

    /// Commit pending documents, carrying the previous payload forward.
    ///
    /// A plain Tantivy commit clears the payload, which would erase the
    /// progress recorded by an earlier commit.
    pub fn commit_preserving_payload(&self) -> Result<u64, SearchError> {
        let mut writer = self.lock()?;
        let payload = stored_payload(&self.index)?;
        let mut prepared = writer.prepare_commit()?;
        if let Some(payload) = &payload {
            prepared.set_payload(payload);
        }
        let opstamp = prepared.commit()?;
        debug!(opstamp, payload = ?payload, "Committed index");
        Ok(opstamp)
    }

    /// Payload stored with the most recent commit.
    pub fn payload(&self) -> Result<Option<String>, SearchError> {
        stored_payload(&self.index)
    }

    /// Discard documents added since the last commit.
    pub fn rollback(&self) -> Result<(), SearchError> {
        let mut writer = self.lock()?;
        writer.rollback()?;
        debug!("Rolled back uncommitted documents");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn item(id: &str, name: &str) -> Item {
        Item::new(id, name, Path::new("/thumbs"))
    }

    fn doc_count(index: &SearchIndex) -> u64 {
        let reader = index.reader().unwrap();
        reader.reload().unwrap();
        reader.searcher().num_docs()
    }

    #[test]
    fn test_commit_with_payload() {
        let index = SearchIndex::in_ram().unwrap();
        let indexer = ItemIndexer::new(&index).unwrap();

        indexer
            .upsert_items(&[item("a", "Alpha"), item("b", "Beta")])
            .unwrap();
        indexer.commit_with_payload("2").unwrap();

        assert_eq!(indexer.payload().unwrap().as_deref(), Some("2"));
        assert_eq!(doc_count(&index), 2);
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let index = SearchIndex::in_ram().unwrap();
        let indexer = ItemIndexer::new(&index).unwrap();

        indexer.upsert_items(&[item("a", "Alpha")]).unwrap();
        indexer.commit_with_payload("1").unwrap();
        indexer.upsert_items(&[item("a", "Alpha again")]).unwrap();
        indexer.commit_with_payload("1").unwrap();

        assert_eq!(doc_count(&index), 1);
    }

    #[test]
    fn test_commit_preserving_payload() {
        let index = SearchIndex::in_ram().unwrap();
        let indexer = ItemIndexer::new(&index).unwrap();

        indexer.upsert_items(&[item("a", "Alpha")]).unwrap();
        indexer.commit_with_payload("6").unwrap();

        indexer.upsert_items(&[item("z", "Zulu")]).unwrap();
        indexer.commit_preserving_payload().unwrap();

        assert_eq!(index.stored_payload().unwrap().as_deref(), Some("6"));
        assert_eq!(doc_count(&index), 2);
    }

    #[test]
    fn test_rollback_discards_uncommitted() {
        let index = SearchIndex::in_ram().unwrap();
        let indexer = ItemIndexer::new(&index).unwrap();

        indexer.upsert_items(&[item("a", "Alpha")]).unwrap();
        indexer.commit_with_payload("1").unwrap();
        indexer.upsert_items(&[item("b", "Beta")]).unwrap();
        indexer.rollback().unwrap();
        indexer.commit_preserving_payload().unwrap();

        assert_eq!(doc_count(&index), 1);
        assert_eq!(indexer.payload().unwrap().as_deref(), Some("1"));
    }
}
