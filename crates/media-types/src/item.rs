//! Media item type.
//!
//! Items are created once when the catalog is loaded and never mutated.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most stars a rating renders as.
pub const MAX_STARS: usize = 5;

/// A single media item from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique, immutable identifier (also the index document key)
    pub identifier: String,

    /// Display name
    pub name: String,

    /// Rating, 0.0 when the catalog has none
    #[serde(default)]
    pub rating: f32,

    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,

    /// Creation date of the underlying media
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Derived location of the item's thumbnail
    pub thumbnail_path: PathBuf,
}

impl Item {
    /// Create an item, deriving the thumbnail location from `thumbnail_dir`.
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        thumbnail_dir: &Path,
    ) -> Self {
        let identifier = identifier.into();
        let thumbnail_path = thumbnail_location(thumbnail_dir, &identifier);
        Self {
            identifier,
            name: name.into(),
            rating: 0.0,
            description: None,
            created_at: None,
            thumbnail_path,
        }
    }

    /// Set the rating.
    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = rating;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Rating rendered as one star per whole point (empty below 1 or NaN),
    /// capped at [`MAX_STARS`].
    pub fn rating_stars(&self) -> String {
        let whole = self.rating.clamp(0.0, MAX_STARS as f32) as usize;
        "★".repeat(whole)
    }

    /// Ordering used for query results: display name, then identifier.
    pub fn display_cmp(&self, other: &Item) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.identifier.cmp(&other.identifier))
    }
}

/// Thumbnail path for an identifier: `<dir>/<identifier>.png`.
pub fn thumbnail_location(thumbnail_dir: &Path, identifier: &str) -> PathBuf {
    thumbnail_dir.join(format!("{identifier}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_thumbnail_derived_from_identifier() {
        let item = Item::new("beach", "Beach", Path::new("/data/thumbs"));
        assert_eq!(item.thumbnail_path, PathBuf::from("/data/thumbs/beach.png"));
    }

    #[test]
    fn test_rating_stars() {
        let dir = Path::new("/tmp");
        assert_eq!(Item::new("a", "A", dir).rating_stars(), "");
        assert_eq!(Item::new("a", "A", dir).with_rating(3.7).rating_stars(), "★★★");
        assert_eq!(Item::new("a", "A", dir).with_rating(-2.0).rating_stars(), "");
    }

    #[test]
    fn test_rating_stars_capped() {
        let dir = Path::new("/tmp");
        let five = "★".repeat(MAX_STARS);
        assert_eq!(Item::new("a", "A", dir).with_rating(5.0).rating_stars(), five);
        assert_eq!(Item::new("a", "A", dir).with_rating(1e30).rating_stars(), five);
        assert_eq!(Item::new("a", "A", dir).with_rating(f32::INFINITY).rating_stars(), five);
        assert_eq!(Item::new("a", "A", dir).with_rating(f32::NAN).rating_stars(), "");
    }

    #[test]
    fn test_display_order_breaks_ties_by_identifier() {
        let dir = Path::new("/tmp");
        let a = Item::new("b-id", "Sunset", dir);
        let b = Item::new("a-id", "Sunset", dir);
        let c = Item::new("z-id", "Apple", dir);

        assert_eq!(a.display_cmp(&b), Ordering::Greater);
        assert_eq!(c.display_cmp(&a), Ordering::Less);
    }
}
