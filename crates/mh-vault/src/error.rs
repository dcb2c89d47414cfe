//! Vault error types.

use thiserror::Error;

/// Errors from the encryption subsystem.
#[derive(Debug, Error)]
pub enum VaultError {
    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata or verification blob could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `encryptProfile` called on a profile that already has metadata
    /// (spec §4.E: "refuses if metadata already present").
    #[error("profile is already encrypted")]
    AlreadyEncrypted,

    /// `decryptProfile`/`verifyPassword` called on a profile with no
    /// encryption metadata.
    #[error("profile is not encrypted")]
    NotEncrypted,

    /// The supplied password did not verify against the profile's
    /// verification blob.
    #[error("password verification failed")]
    WrongPassword,

    /// `lockProfile`/`unlockProfile` called on a profile whose
    /// `passwordMode` is not `loginPassword` (spec §4.E).
    #[error("profile password mode is not loginPassword")]
    NotLoginPasswordMode,

    /// A lower-level cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] mh_crypto::CryptoError),

    /// The blocking task running the encrypt/decrypt walk panicked or
    /// was cancelled.
    #[error("background task failed: {0}")]
    TaskJoin(String),
}

impl From<tokio::task::JoinError> for VaultError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;
