//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The remote answered with a non-success status.
    #[error("server returned status {0}")]
    Status(u16),

    /// The remote payload could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The remote did not answer in time.
    #[error("operation timed out")]
    Timeout,

    /// Another sync cycle is still running.
    #[error("sync already in progress")]
    AlreadyInFlight,

    /// The conflict index is out of range or already resolved.
    #[error("conflict {index} is not pending")]
    ConflictNotPending {
        /// Index in the session's conflict list.
        index: usize,
    },

    /// Conflicts remain, so the session cannot commit yet.
    #[error("{pending} conflicts still pending")]
    ConflictsPending {
        /// Number of unresolved conflicts.
        pending: usize,
    },

    /// A newer sync cycle has already committed.
    #[error("conflict session is stale: a newer sync cycle has committed")]
    StaleSession,

    /// The session has already committed its merged set.
    #[error("conflict session already committed")]
    AlreadyCommitted,

    /// A conflict choice could not be parsed.
    #[error("invalid conflict choice {0:?}, expected \"local\" or \"server\"")]
    InvalidChoice(String),

    /// Repository error during commit or publish.
    #[error("repository error: {0}")]
    Core(#[from] quotesync_core::CoreError),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the next cycle may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Timeout | SyncError::AlreadyInFlight => true,
            SyncError::Status(code) => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout
        } else if err.is_decode() {
            SyncError::Protocol(err.to_string())
        } else if err.is_builder() {
            SyncError::transport_fatal(err.to_string())
        } else {
            SyncError::transport_retryable(err.to_string())
        }
    }
}
