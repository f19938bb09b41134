//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store file is corrupted.
    #[error("store corrupted: {0}")]
    Corrupted(String),

    /// The data directory is locked by another process.
    #[error("data directory is in use by another process: {}", .0.display())]
    Locked(PathBuf),

    /// The store contents could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
