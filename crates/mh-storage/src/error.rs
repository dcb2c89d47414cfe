//! Storage error types.

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested key, file, or record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A file lock could not be acquired.
    #[error("lock error: {0}")]
    Lock(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
