//! Catalog record schema and validation.
//!
//! The catalog is a JSON array of loosely-shaped records. Each record is
//! decoded into [`CatalogRecord`] (every field optional) and then validated
//! into an [`Item`]. Validation never fails the whole load: a bad record
//! yields [`RecordOutcome::Skipped`] with the reason.
//!
//! Fields are decoded leniently. A field with the wrong type reads as absent,
//! so only a missing identifier or name drops a record.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::item::Item;

/// A raw catalog record before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Required. Older catalogs call this field `file`.
    #[serde(default, alias = "file", deserialize_with = "lenient")]
    pub identifier: Option<String>,

    /// Required display name
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub rating: Option<f32>,

    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,

    /// RFC 3339 timestamp
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<DateTime<Utc>>,
}

/// Decode a field, reading a value of the wrong type as `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Why a record was dropped during load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A required field is absent or empty
    MissingField(&'static str),
    /// The record is not an object
    Malformed(String),
    /// The identifier was already used by an earlier record
    DuplicateIdentifier(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingField(field) => write!(f, "missing required field '{field}'"),
            SkipReason::Malformed(detail) => write!(f, "malformed record: {detail}"),
            SkipReason::DuplicateIdentifier(id) => write!(f, "duplicate identifier '{id}'"),
        }
    }
}

/// Result of validating one catalog record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Item(Item),
    Skipped { position: usize, reason: SkipReason },
}

impl CatalogRecord {
    /// Validate into an item, or report which required field is missing.
    pub fn into_item(self, thumbnail_dir: &Path) -> Result<Item, SkipReason> {
        let identifier = self
            .identifier
            .filter(|s| !s.is_empty())
            .ok_or(SkipReason::MissingField("identifier"))?;
        let name = self.name.ok_or(SkipReason::MissingField("name"))?;

        let mut item = Item::new(identifier, name, thumbnail_dir);
        item.rating = self.rating.unwrap_or(0.0);
        item.description = self.description;
        item.created_at = self.date;
        Ok(item)
    }
}

/// Decode and validate the record at `position`.
pub fn parse_record(position: usize, value: &Value, thumbnail_dir: &Path) -> RecordOutcome {
    if !value.is_object() {
        return RecordOutcome::Skipped {
            position,
            reason: SkipReason::Malformed(format!("expected an object, found {}", kind(value))),
        };
    }

    let record = match CatalogRecord::deserialize(value) {
        Ok(record) => record,
        Err(e) => {
            return RecordOutcome::Skipped {
                position,
                reason: SkipReason::Malformed(e.to_string()),
            }
        }
    };

    match record.into_item(thumbnail_dir) {
        Ok(item) => RecordOutcome::Item(item),
        Err(reason) => RecordOutcome::Skipped { position, reason },
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode every record of a catalog array, in order.
pub fn parse_records(values: &[Value], thumbnail_dir: &Path) -> Vec<RecordOutcome> {
    values
        .iter()
        .enumerate()
        .map(|(position, value)| parse_record(position, value, thumbnail_dir))
        .collect()
}
