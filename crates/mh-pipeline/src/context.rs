//! What a caller supplies about one inbound request, and what the
//! pipeline hands back after resolving it (spec §4.D steps 1-2).

use mh_identity::Session;

/// The bits of an inbound request the pipeline needs that don't come
/// from the session cookie itself. `mh-server` fills this in from the
/// Axum request before calling [`crate::Pipeline::build_context`].
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// The raw `mh_session` cookie value, if the client sent one.
    pub session_cookie: Option<String>,
    /// `User-Agent` header, recorded on session creation only.
    pub user_agent: Option<String>,
    /// Client IP, recorded on session creation only.
    pub ip: Option<String>,
}

/// The result of resolving a request: the [`mh_core::UserContext`]
/// every handler runs under, plus the underlying session record (when
/// one was found and still valid) so callers like logout can act on it
/// directly without a second lookup.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// The request-local context handlers receive (spec §4.D step 2).
    pub user: mh_core::UserContext,
    /// `None` for anonymous requests, or when the supplied cookie named
    /// a missing/expired session (both resolve to an anonymous context).
    pub session: Option<Session>,
}

impl PipelineContext {
    /// True if this request carries a still-valid session.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}
