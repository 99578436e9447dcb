//! Serializable projection of a virtual tree
//!
//! The snapshot is a flat JSON object keyed by absolute path, in pre-order:
//!
//! ```json
//! {
//!   "/components": { "type": "directory" },
//!   "/components/Button.jsx": { "type": "file", "content": "...", "history": ["..."] }
//! }
//! ```
//!
//! `history` is most-recent-first and may be omitted.

use super::error::{SnapshotError, SnapshotResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One node of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SnapshotEntry {
    Directory,
    File {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        history: Vec<String>,
    },
}

/// The persisted form of a virtual filesystem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: IndexMap<String, SnapshotEntry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot from its JSON text
    pub fn from_json(json: &str) -> SnapshotResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a snapshot from an already-decoded JSON value
    pub fn from_value(value: serde_json::Value) -> SnapshotResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> String {
        // A map of strings to plain enums cannot fail to serialize
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn insert(&mut self, path: impl Into<String>, entry: SnapshotEntry) {
        self.entries.insert(path.into(), entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &SnapshotEntry)> {
        self.entries.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SnapshotError {
    pub(crate) fn invalid_path(path: &str) -> Self {
        SnapshotError::InvalidPath(path.to_string())
    }
}
