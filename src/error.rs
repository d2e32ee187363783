//! Error taxonomy shared across the crate

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by the catalog, store, coordination and session layers.
#[derive(Debug, Error)]
pub enum SelectError {
    /// Referenced product or image is absent from the catalog.
    ///
    /// Always a caller bug or a stale record, never silently ignored.
    #[error("not found in catalog: {0}")]
    NotFound(String),

    /// Shared storage could not be read or written.
    ///
    /// Surfaced to the operator verbatim; the in-memory selection that
    /// failed to persist stays intact so the save can be retried.
    #[error("storage error at {path}: {message}")]
    Persist { path: PathBuf, message: String },

    /// Navigation index outside `[0, product_count)`.
    #[error("index {index} out of range (catalog has {count} products)")]
    OutOfRange { index: usize, count: usize },

    /// The catalog source tree is missing or unreadable at startup.
    #[error("catalog unavailable at {path}: {message}")]
    Catalog { path: PathBuf, message: String },
}

impl SelectError {
    pub fn persist(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Persist {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn catalog(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Catalog {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Result type used by the library modules
pub type Result<T> = std::result::Result<T, SelectError>;
