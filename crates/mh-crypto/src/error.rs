//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// Invalid hex encoding.
    #[error("invalid hex encoding")]
    InvalidHexEncoding,

    /// Invalid base64 encoding.
    #[error("invalid base64 encoding")]
    InvalidBase64Encoding,

    /// Password does not satisfy the configured strength check.
    #[error("password too weak: {0}")]
    WeakPassword(String),

    /// A stored password/recovery-code hash failed to verify against the
    /// supplied candidate (wrong password, not a system error).
    #[error("password verification failed")]
    VerificationFailed,

    /// AES-GCM encryption or decryption failed (bad key, tampered
    /// ciphertext, or truncated input).
    #[error("cipher operation failed: {0}")]
    CipherFailed(String),

    /// I/O error (e.g. reading/writing key files).
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for CryptoError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
