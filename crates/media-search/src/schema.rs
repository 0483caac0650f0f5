//! Tantivy schema for media items.

use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};

use crate::SearchError;

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct ItemSchema {
    schema: Schema,
    /// Primary key (STRING | STORED)
    pub identifier: Field,
    /// Display name (TEXT | STORED)
    pub name: Field,
    /// Description (TEXT)
    pub description: Field,
    /// Rating (f64, STORED)
    pub rating: Field,
    /// Creation time in milliseconds (i64, STORED)
    pub created_ms: Field,
    /// Thumbnail path (STRING | STORED)
    pub thumbnail: Field,
}

impl ItemSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Resolve field handles from an existing Tantivy schema.
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaMismatch(format!("missing {name} field")))
        };

        Ok(Self {
            identifier: field("identifier")?,
            name: field("name")?,
            description: field("description")?,
            rating: field("rating")?,
            created_ms: field("created_ms")?,
            thumbnail: field("thumbnail")?,
            schema,
        })
    }
}

/// Build the item search schema.
pub fn build_item_schema() -> ItemSchema {
    let mut schema_builder = Schema::builder();

    let identifier = schema_builder.add_text_field("identifier", STRING | STORED);
    let name = schema_builder.add_text_field("name", TEXT | STORED);
    let description = schema_builder.add_text_field("description", TEXT);
    let rating = schema_builder.add_f64_field("rating", STORED);
    let created_ms = schema_builder.add_i64_field("created_ms", STORED);
    let thumbnail = schema_builder.add_text_field("thumbnail", STRING | STORED);

    ItemSchema {
        schema: schema_builder.build(),
        identifier,
        name,
        description,
        rating,
        created_ms,
        thumbnail,
    }
}
