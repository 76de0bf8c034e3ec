//! Error types for store operations
//!
//! Callers match on `StoreError` variants to tell an expected miss
//! (`KeyNotFound`) apart from a damaged data file (`Corrupt`) or a
//! filesystem failure (`Io`).

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lookup or removal of a key that is not in the store
    #[error("key not found")]
    KeyNotFound,

    /// The data file exists and is non-empty but does not decode as entries
    #[error("corrupt data file {} (line {line}): {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem-level failure while reading or writing the data file
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Create an IO error for `path`
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a corrupt-data error for `path` at 1-based `line`
    pub(crate) fn corrupt(path: &Path, line: usize, source: serde_json::Error) -> Self {
        StoreError::Corrupt {
            path: path.to_path_buf(),
            line,
            source,
        }
    }
}
