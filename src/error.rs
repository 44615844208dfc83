//! Error types for catalog queries.

use thiserror::Error;

/// Catalog operation result type.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors surfaced by the browse engine and its backends.
///
/// A folder that does not exist is not an error: lookups return `None`
/// and listings return an empty page.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Malformed catalog path (absolute, empty segment, `.`/`..`)
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// Entry record rejected at construction
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// The relational store could not be read
    #[error("Catalog store unavailable: {0}")]
    BackendUnavailable(#[from] rusqlite::Error),

    /// IO error (snapshot files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CatalogError {
    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    /// Create an invalid entry error.
    pub fn invalid_entry(msg: impl Into<String>) -> Self {
        Self::InvalidEntry(msg.into())
    }

    /// True when the failure is the store itself rather than the request.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }
}
