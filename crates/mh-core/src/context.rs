//! The explicit, request-scoped replacement for ambient/process-global
//! user context (spec §9 design note).

use std::path::PathBuf;

use crate::mode::ModeSnapshot;
use crate::types::{Role, UserId};

/// Everything a handler needs to know about who is making a request and
/// where their data lives. Constructed once per request by the Request
/// Pipeline (spec §4.D step 2) and threaded through explicitly — never
/// stashed in a thread-local or process-global.
#[derive(Debug, Clone)]
pub struct UserContext {
    /// `None` for anonymous sessions.
    pub user_id: Option<UserId>,
    /// `None` for anonymous sessions.
    pub username: Option<String>,
    /// Always present; `Role::Anonymous` when there is no valid session.
    pub role: Role,
    /// The resolved profile root this request may act under, if any.
    /// Anonymous and cross-profile requests carry `None` here — handlers
    /// must never substitute another user's root.
    pub profile_root: Option<PathBuf>,
    /// The process cognitive mode observed at context-construction time,
    /// so a single request sees a coherent `(mode, role)` pair even if the
    /// global mode changes mid-request.
    pub mode: ModeSnapshot,
}

impl UserContext {
    /// Build the context for an unauthenticated (no/expired session) caller.
    #[must_use]
    pub fn anonymous(mode: ModeSnapshot) -> Self {
        Self {
            user_id: None,
            username: None,
            role: Role::Anonymous,
            profile_root: None,
            mode,
        }
    }

    /// Build the context for an authenticated caller with a resolved
    /// profile root.
    #[must_use]
    pub fn authenticated(
        user_id: UserId,
        username: impl Into<String>,
        role: Role,
        profile_root: PathBuf,
        mode: ModeSnapshot,
    ) -> Self {
        Self {
            user_id: Some(user_id),
            username: Some(username.into()),
            role,
            profile_root: Some(profile_root),
            mode,
        }
    }

    /// True if this context may read its own profile (spec §4.C
    /// `read-profile`: all authenticated roles, own profile only).
    #[must_use]
    pub fn owns_profile(&self, candidate_username: &str) -> bool {
        self.username.as_deref() == Some(candidate_username)
    }
}
