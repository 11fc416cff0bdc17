//! Error types for the settings store.

use thiserror::Error;

/// Failure reported by a storage backend.
///
/// The store never inspects the variant: every backend failure collapses into
/// [`StoreError::Backend`] carrying the rendered message.
#[derive(Debug, Error)]
pub enum BackendFailure {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("QUOTA_BYTES quota exceeded ({used} of {quota} bytes)")]
    QuotaExceeded { used: usize, quota: usize },

    #[error("failed to serialize value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which store operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Get,
    Set,
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreOperation::Get => f.write_str("get"),
            StoreOperation::Set => f.write_str("set"),
        }
    }
}

/// Errors surfaced by [`Store`](super::Store).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store.{operation}(): failed to {operation} items {keys:?}: {message}")]
    Backend {
        operation: StoreOperation,
        keys: Vec<String>,
        message: String,
    },

    #[error("Setting '{0}' is not registered")]
    UnknownKey(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
