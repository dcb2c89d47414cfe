//! Storage router errors (spec §4.B).

use thiserror::Error;

/// Errors from path resolution. None of these leak the attempted path
/// in their `Display` output — callers that want it for an audit record
/// read it back from the request they built, not from the error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// `relativePath` was absolute.
    #[error("relative path must not be absolute")]
    AbsolutePath,
    /// `relativePath` contained a `..` component.
    #[error("relative path must not traverse upward")]
    PathTraversal,
    /// `relativePath` resolves outside the profile root after normalization.
    #[error("path resolves outside the profile root")]
    OutsideProfileRoot,
    /// `relativePath` targets a forbidden fragment (`brain/`, `packages/`, …).
    #[error("path targets a reserved directory")]
    ReservedFragment,
    /// The profile root itself sits under a forbidden absolute prefix.
    #[error("profile path targets a reserved system location")]
    ReservedRoot,
    /// `category = system` was requested by a non-internal caller.
    #[error("system category is restricted to internal callers")]
    SystemCategoryForbidden,
    /// `user.metadata.profilePath` failed validation; caller should retry
    /// with the default path and emit a `profile_path_fallback` audit event
    /// (the [`crate::Resolved::fallback_used`] flag signals this case).
    #[error("configured profile path is invalid: {0}")]
    ProfilePathInvalid(String),
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;
