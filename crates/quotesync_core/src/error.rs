//! Error types for QuoteSync core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] quotesync_storage::StorageError),

    /// JSON encoding or decoding error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required field was empty after trimming.
    #[error("{field} must not be empty")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
    },

    /// An import file was not a JSON array of quotes.
    #[error("invalid import file: {0}")]
    InvalidImport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::Validation { field: "category" };
        assert_eq!(err.to_string(), "category must not be empty");

        let err = CoreError::InvalidImport("expected a JSON array".into());
        assert!(err.to_string().contains("expected a JSON array"));
    }
}
