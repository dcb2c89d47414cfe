//! The stable error taxonomy shared by every Metahost crate.
//!
//! Every error that can cross a component boundary carries one of these
//! kinds. `mh-server` is the only place that knows how to turn a kind into
//! an HTTP status code; everything below it just propagates `MhError`.

use thiserror::Error;

/// Stable error identifiers. Names match the spec's error kinds exactly so
/// that log lines and API error bodies are self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No session, or an expired one, on a route that requires one.
    Unauthenticated,
    /// A role, mode, or policy denial.
    Forbidden,
    /// Schema, path, or password-strength validation failure.
    Validation,
    /// Dataset, user, or approval record not found.
    NotFound,
    /// Duplicate user, already-approved, already-running.
    Conflict,
    /// Eval not passed, profile not (un)encrypted as required.
    Precondition,
    /// Model server unreachable or similar upstream failure.
    Transient,
    /// Uncaught/unexpected failure; detail stays out of the response body.
    Internal,
}

impl ErrorKind {
    /// A short machine-stable code, e.g. for API error bodies.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Precondition => "PRECONDITION",
            Self::Transient => "TRANSIENT",
            Self::Internal => "INTERNAL",
        }
    }
}

/// A crate-wide error carrying a stable [`ErrorKind`] plus a human message.
#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct MhError {
    kind: ErrorKind,
    message: String,
}

impl MhError {
    /// Construct a new error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for [`ErrorKind::Unauthenticated`].
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    /// Shorthand for [`ErrorKind::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Shorthand for [`ErrorKind::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Shorthand for [`ErrorKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Shorthand for [`ErrorKind::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Shorthand for [`ErrorKind::Precondition`].
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Precondition, message)
    }

    /// Shorthand for [`ErrorKind::Transient`].
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    /// Shorthand for [`ErrorKind::Internal`]. Callers should log the real
    /// cause before constructing this — the message reaching API clients
    /// is opaque by design (spec §7).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// The stable kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable detail. Never shown to clients for `Internal`.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for MhError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err.to_string())
    }
}

/// Convenience alias used throughout the workspace.
pub type MhResult<T> = Result<T, MhError>;
