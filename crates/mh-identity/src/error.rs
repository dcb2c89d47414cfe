//! Identity & session store errors (spec §4.A).

use thiserror::Error;

/// Errors from identity and session operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// `createUser` with a username already present.
    #[error("username already taken")]
    UsernameTaken,
    /// `createUser` with a username that fails `^[A-Za-z0-9_-]{3,50}$`.
    #[error("invalid username: {0}")]
    InvalidUsername(String),
    /// `createUser` with a password shorter than the minimum length.
    #[error("{0}")]
    WeakPassword(String),
    /// No such user.
    #[error("user not found: {0}")]
    UserNotFound(String),
    /// No such session, or it has expired.
    #[error("session not found")]
    SessionNotFound,
    /// Recovery code invalid, already consumed, or for the wrong user.
    #[error("invalid recovery code")]
    InvalidRecoveryCode,
    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] mh_storage::StorageError),
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

impl From<&IdentityError> for mh_core::ErrorKind {
    fn from(err: &IdentityError) -> Self {
        match err {
            IdentityError::UsernameTaken => mh_core::ErrorKind::Conflict,
            IdentityError::InvalidUsername(_) | IdentityError::WeakPassword(_) => {
                mh_core::ErrorKind::Validation
            }
            IdentityError::UserNotFound(_) | IdentityError::SessionNotFound => {
                mh_core::ErrorKind::NotFound
            }
            IdentityError::InvalidRecoveryCode => mh_core::ErrorKind::Validation,
            IdentityError::Storage(_) => mh_core::ErrorKind::Internal,
        }
    }
}
