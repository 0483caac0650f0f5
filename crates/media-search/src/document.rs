//! Mapping from items to Tantivy documents.

use tantivy::doc;
use tantivy::TantivyDocument;

use media_types::Item;

use crate::schema::ItemSchema;

/// Convert an item to a Tantivy document.
///
/// Optional attributes are only added when present.
pub fn item_to_doc(schema: &ItemSchema, item: &Item) -> TantivyDocument {
    let mut doc = doc!(
        schema.identifier => item.identifier.clone(),
        schema.name => item.name.clone(),
        schema.rating => f64::from(item.rating),
        schema.thumbnail => item.thumbnail_path.to_string_lossy().to_string()
    );

    if let Some(description) = &item.description {
        doc.add_text(schema.description, description);
    }
    if let Some(created_at) = item.created_at {
        doc.add_i64(schema.created_ms, created_at.timestamp_millis());
    }

    doc
}
