//! # media-types
//!
//! Shared domain types for the media-index system.
//!
//! - [`Item`]: an immutable media record loaded from the catalog
//! - [`CatalogRecord`] / [`RecordOutcome`]: typed catalog schema and the
//!   per-record parse result (item or skip-with-reason)
//! - [`Settings`]: layered configuration
//! - [`MediaError`]: errors shared across crates

pub mod catalog;
pub mod config;
pub mod error;
pub mod item;

pub use catalog::{parse_record, parse_records, CatalogRecord, RecordOutcome, SkipReason};
pub use config::Settings;
pub use error::MediaError;
pub use item::{Item, MAX_STARS};
