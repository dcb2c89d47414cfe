//! Audit-related error types.

use thiserror::Error;

/// Errors that can occur with audit logging.
#[derive(Debug, Error)]
pub enum AuditError {
    /// A filesystem operation on the day's NDJSON file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be serialized or an existing line could not be
    /// parsed back.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The day file's lock sidecar could not be acquired.
    #[error("lock error: {0}")]
    Lock(String),

    /// Chain integrity violation detected while verifying a day's file.
    #[error("chain integrity violation in {date} at line {line}: {reason}")]
    IntegrityViolation {
        /// The day file in which the violation was found.
        date: String,
        /// 1-based line number of the offending entry.
        line: usize,
        /// Why the chain is invalid.
        reason: String,
    },
}

impl From<mh_storage::StorageError> for AuditError {
    fn from(err: mh_storage::StorageError) -> Self {
        match err {
            mh_storage::StorageError::Lock(msg) => Self::Lock(msg),
            mh_storage::StorageError::Io(e) => Self::Io(e),
            mh_storage::StorageError::Serialization(e) => Self::Serialization(e),
            mh_storage::StorageError::NotFound(msg) => Self::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                msg,
            )),
        }
    }
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
