//! Shared fixtures for unit tests.

use std::path::Path;

use media_store::ItemStore;
use media_types::Item;

/// Store of `count` items named `item-00`, `item-01`, ...
pub fn numbered_store(count: usize) -> ItemStore {
    ItemStore::from_items(
        (0..count).map(|i| Item::new(format!("item-{i:02}"), format!("Item {i}"), Path::new("/thumbs"))),
    )
}
