//! Virtual filesystem error types

use thiserror::Error;

/// Errors returned by virtual filesystem operations
///
/// Every operation that returns one of these leaves the tree untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VfsError {
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Path conflicts with an existing node: {0}")]
    Conflict(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Text to replace was not found in {0}")]
    NoMatch(String),

    #[error("Text to replace occurs {count} times in {path}; provide more context")]
    AmbiguousMatch { path: String, count: usize },

    #[error("No edit history for {0}")]
    NoHistory(String),

    #[error("Invalid path for this operation: {0}")]
    InvalidPath(String),
}

/// Result type for virtual filesystem operations
pub type VfsResult<T> = Result<T, VfsError>;

/// Errors raised while re-hydrating a tree from a snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot key is not a normalized absolute path: {0}")]
    InvalidPath(String),

    #[error("Snapshot entry conflicts with another entry: {0}")]
    Conflict(String),

    #[error("Failed to parse snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;
