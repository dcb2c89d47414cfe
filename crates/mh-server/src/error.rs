//! Translating every crate's error type into an HTTP response (spec §7).
//!
//! `ApiError` is the one place that knows the mapping from a stable
//! [`mh_core::ErrorKind`] to a status code. Every handler returns
//! `Result<T, ApiError>`; the body is always `{"error": {"code",
//! "message"}}`, except `Internal`, whose `message` is replaced with a
//! fixed opaque string (the real cause goes to `tracing::error!` only).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mh_core::{ErrorKind, MhError};

/// The error type every `mh-server` handler returns.
#[derive(Debug)]
pub struct ApiError(MhError);

impl ApiError {
    /// The stable kind backing this response.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.0.kind()
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Precondition => StatusCode::PRECONDITION_FAILED,
        ErrorKind::Transient => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        let message = if kind == ErrorKind::Internal {
            tracing::error!(error = %self.0.message(), "internal error");
            "an internal error occurred".to_string()
        } else {
            self.0.message().to_string()
        };

        (
            status,
            Json(serde_json::json!({
                "error": { "code": kind.code(), "message": message }
            })),
        )
            .into_response()
    }
}

impl From<MhError> for ApiError {
    fn from(err: MhError) -> Self {
        Self(err)
    }
}

impl From<mh_identity::IdentityError> for ApiError {
    fn from(err: mh_identity::IdentityError) -> Self {
        let kind = ErrorKind::from(&err);
        Self(MhError::new(kind, err.to_string()))
    }
}

impl From<mh_router::RouterError> for ApiError {
    fn from(err: mh_router::RouterError) -> Self {
        let kind = match err {
            mh_router::RouterError::SystemCategoryForbidden => ErrorKind::Forbidden,
            mh_router::RouterError::AbsolutePath
            | mh_router::RouterError::PathTraversal
            | mh_router::RouterError::OutsideProfileRoot
            | mh_router::RouterError::ReservedFragment
            | mh_router::RouterError::ReservedRoot
            | mh_router::RouterError::ProfilePathInvalid(_) => ErrorKind::Validation,
        };
        Self(MhError::new(kind, err.to_string()))
    }
}

impl From<mh_vault::VaultError> for ApiError {
    fn from(err: mh_vault::VaultError) -> Self {
        let kind = match err {
            mh_vault::VaultError::AlreadyEncrypted
            | mh_vault::VaultError::NotEncrypted
            | mh_vault::VaultError::NotLoginPasswordMode => ErrorKind::Precondition,
            mh_vault::VaultError::WrongPassword => ErrorKind::Validation,
            mh_vault::VaultError::Io(_)
            | mh_vault::VaultError::Serialization(_)
            | mh_vault::VaultError::Crypto(_)
            | mh_vault::VaultError::TaskJoin(_) => ErrorKind::Internal,
        };
        Self(MhError::new(kind, err.to_string()))
    }
}

impl From<mh_agents::AgentError> for ApiError {
    fn from(err: mh_agents::AgentError) -> Self {
        let kind = match err {
            mh_agents::AgentError::DuplicateAgent { .. } => ErrorKind::Conflict,
            mh_agents::AgentError::InvalidConfig { .. } => ErrorKind::Validation,
            mh_agents::AgentError::Io(_)
            | mh_agents::AgentError::Storage(_)
            | mh_agents::AgentError::Router(_)
            | mh_agents::AgentError::Audit(_)
            | mh_agents::AgentError::SpawnFailed { .. }
            | mh_agents::AgentError::SpawnTimeout { .. }
            | mh_agents::AgentError::Signal { .. } => ErrorKind::Internal,
        };
        Self(MhError::new(kind, err.to_string()))
    }
}

impl From<mh_orchestrator::OrchestratorError> for ApiError {
    fn from(err: mh_orchestrator::OrchestratorError) -> Self {
        let kind = err.kind();
        Self(MhError::new(kind, err.to_string()))
    }
}

impl From<mh_storage::StorageError> for ApiError {
    fn from(err: mh_storage::StorageError) -> Self {
        Self(MhError::internal(err.to_string()))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self(MhError::internal(err.to_string()))
    }
}
