//! Progress marker persisted with each committed batch.
//!
//! The marker is the position of the next unindexed item. All items before
//! it have been submitted and committed; none after it have.

use serde::{Deserialize, Serialize};

use crate::error::IndexingError;

/// Sentinel some backends store once a catalog is fully indexed.
const DONE_SENTINEL: &str = "Done";

/// Decoded progress marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMarker {
    /// Next unindexed position
    Position(usize),
    /// Everything is indexed
    Done,
}

impl ProgressMarker {
    /// Encode as the decimal string of the position.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Decode bytes written by [`ProgressMarker::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IndexingError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| IndexingError::Marker(format!("marker is not UTF-8: {e}")))?;
        let text = text.trim();
        if text == DONE_SENTINEL {
            return Ok(ProgressMarker::Done);
        }
        text.parse::<usize>()
            .map(ProgressMarker::Position)
            .map_err(|e| IndexingError::Marker(format!("invalid marker {text:?}: {e}")))
    }

    /// Position to resume from for a store of `count` items.
    ///
    /// Returns `None` when nothing is left to index.
    pub fn resume_position(&self, count: usize) -> Option<usize> {
        match self {
            ProgressMarker::Position(position) if *position < count => Some(*position),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProgressMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressMarker::Position(position) => write!(f, "{position}"),
            ProgressMarker::Done => write!(f, "{DONE_SENTINEL}"),
        }
    }
}
