//! The request pipeline itself (spec §4.D): session resolution → context
//! construction → auth-gate check → (handler runs in `mh-server`) →
//! audit emission.
//!
//! Grounded on `sblanchard-SerialAgent`'s `api/auth.rs` `require_api_token`
//! middleware (a cheap, pre-computed check run once per request) and
//! generalized from a single static bearer token to full cookie-session
//! resolution against `mh-identity`'s store, and on `astrid-runtime`'s
//! `AgentSession` for the shape of the resulting per-request context
//! value — an explicit struct threaded through call sites, never a
//! thread-local or process-global (spec §9).

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use mh_audit::{Actor, AuditLog, Level};
use mh_core::{AppRoot, CognitiveModeCell, ErrorKind, MhError, MhResult, SessionId, UserContext};
use mh_identity::IdentityStore;
use mh_policy::Decision;

use crate::context::{PipelineContext, RequestMeta};
use crate::gate::AuthGate;

/// Turn a [`mh_policy::DenyReason`] into the stable [`MhError`] kind the
/// HTTP surface translates to a status code (spec §7): an
/// authentication-shaped reason becomes `401`, everything else is `403`.
fn deny_to_error(reason: mh_policy::DenyReason) -> MhError {
    match reason {
        mh_policy::DenyReason::Unauthenticated => MhError::unauthenticated(reason.code()),
        _ => MhError::forbidden(reason.code()),
    }
}

/// Everything the request pipeline needs to resolve a caller and gate an
/// operation: the identity store, the installation root (for profile-path
/// resolution), the process-wide cognitive mode, and the audit log.
/// Built once at server startup and shared (cheaply cloneable) across
/// every request.
#[derive(Clone)]
pub struct Pipeline {
    identity: IdentityStore,
    app_root: AppRoot,
    mode: Arc<CognitiveModeCell>,
    audit: AuditLog,
}

impl Pipeline {
    /// Wire a pipeline to its four dependencies.
    #[must_use]
    pub fn new(identity: IdentityStore, app_root: AppRoot, mode: Arc<CognitiveModeCell>, audit: AuditLog) -> Self {
        Self {
            identity,
            app_root,
            mode,
            audit,
        }
    }

    /// Steps 1-2: resolve the session cookie (if any) to a validated
    /// session and user, then build the [`UserContext`] every handler
    /// runs under. An absent, unparsable, unknown, or expired session
    /// all resolve to an anonymous context rather than an error — spec
    /// §4.D step 1: "on failure assign role `anonymous`."
    ///
    /// # Errors
    /// Only returns an error if the identity store itself is unreadable;
    /// session/user lookup misses are not errors here.
    pub fn build_context(&self, meta: &RequestMeta) -> MhResult<PipelineContext> {
        let snapshot = self.mode.snapshot();
        let anonymous = || PipelineContext {
            user: UserContext::anonymous(snapshot),
            session: None,
        };

        let Some(session) = self.resolve_session(meta.session_cookie.as_deref())? else {
            return Ok(anonymous());
        };

        let Some(user) = self
            .identity
            .get_user(session.user_id)
            .map_err(|e| MhError::internal(e.to_string()))?
        else {
            return Ok(anonymous());
        };

        let profile_override = user.metadata.profile_path.as_deref().map(PathBuf::from);
        let (profile_root, fallback_used) =
            mh_router::resolve_profile_root(&self.app_root, &user.username, profile_override.as_deref());

        if fallback_used {
            self.audit
                .record_security(
                    Level::Warn,
                    "profile_path_fallback",
                    Actor::user(user.id, session.role),
                    serde_json::json!({"username": user.username}),
                )
                .map_err(|e| MhError::internal(e.to_string()))?;
        }

        Ok(PipelineContext {
            user: UserContext::authenticated(user.id, user.username, session.role, profile_root, snapshot),
            session: Some(session),
        })
    }

    fn resolve_session(&self, cookie: Option<&str>) -> MhResult<Option<mh_identity::Session>> {
        let Some(raw) = cookie else { return Ok(None) };
        let Ok(id) = SessionId::from_str(raw) else {
            return Ok(None);
        };
        self.identity
            .validate_session(id)
            .map_err(|e| MhError::internal(e.to_string()))
    }

    /// Step 3: check whether `gate` permits this context's `(role, mode)`
    /// pair to proceed (spec §4.D step 3, §4.C decision table).
    ///
    /// # Errors
    /// Returns [`ErrorKind::Unauthenticated`] for a missing/expired
    /// session on a non-public gate, or [`ErrorKind::Forbidden`] for a
    /// role or mode violation.
    pub fn authorize(&self, ctx: &UserContext, gate: AuthGate) -> MhResult<()> {
        self.check(ctx, gate.operation())
    }

    /// Finer-grained check for a specific [`mh_policy::Operation`],
    /// independent of the route-level gate — e.g. a handler gated
    /// `authenticated` that must additionally confirm `start-agent`
    /// before spawning an agent.
    ///
    /// # Errors
    /// See [`Self::authorize`].
    pub fn check(&self, ctx: &UserContext, operation: mh_policy::Operation) -> MhResult<()> {
        match mh_policy::check(ctx.role, ctx.mode.mode, operation) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(deny_to_error(reason)),
        }
    }

    /// Step 5: record a successful completion as `category=action`,
    /// `level=info` (spec §4.D step 5).
    ///
    /// # Errors
    /// Returns an error only if the audit log itself cannot be written.
    pub fn record_action(&self, ctx: &UserContext, event: impl Into<String>, details: serde_json::Value) -> MhResult<()> {
        self.audit
            .record_action(event, actor_of(ctx), details)
            .map(|_| ())
            .map_err(|e| MhError::internal(e.to_string()))
    }

    /// Step 5: record a denial or failure as `category=security` (for
    /// policy/auth denials) with the level implied by the error kind.
    ///
    /// # Errors
    /// Returns an error only if the audit log itself cannot be written.
    pub fn record_denied(&self, ctx: &UserContext, event: impl Into<String>, err: &MhError) -> MhResult<()> {
        let level = match err.kind() {
            ErrorKind::Internal => Level::Error,
            _ => Level::Warn,
        };
        self.audit
            .record_security(
                level,
                event,
                actor_of(ctx),
                serde_json::json!({"reason": err.kind().code()}),
            )
            .map(|_| ())
            .map_err(|e| MhError::internal(e.to_string()))
    }
}

fn actor_of(ctx: &UserContext) -> Actor {
    match ctx.user_id {
        Some(user_id) => Actor::user(user_id, ctx.role),
        None => Actor::anonymous(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mh_core::Role;
    use mh_identity::UserMetadata;

    fn pipeline() -> (tempfile::TempDir, Pipeline) {
        let dir = tempfile::tempdir().unwrap();
        let app_root = AppRoot::at(dir.path());
        app_root.ensure().unwrap();
        let identity = IdentityStore::new(&app_root);
        let audit = AuditLog::new(app_root.system_logs_dir().join("audit"));
        let mode = Arc::new(CognitiveModeCell::new(false));
        (dir, Pipeline::new(identity, app_root, mode, audit))
    }

    #[test]
    fn absent_cookie_resolves_to_anonymous() {
        let (_dir, pipeline) = pipeline();
        let ctx = pipeline.build_context(&RequestMeta::default()).unwrap();
        assert_eq!(ctx.user.role, Role::Anonymous);
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn garbage_cookie_resolves_to_anonymous_not_an_error() {
        let (_dir, pipeline) = pipeline();
        let meta = RequestMeta {
            session_cookie: Some("not-a-uuid".to_string()),
            ..Default::default()
        };
        let ctx = pipeline.build_context(&meta).unwrap();
        assert_eq!(ctx.user.role, Role::Anonymous);
    }

    #[test]
    fn valid_session_resolves_to_authenticated_context_with_profile_root() {
        let (_dir, pipeline) = pipeline();
        let owner = pipeline
            .identity
            .create_user("alice", "correct-horse", Role::Owner, UserMetadata::default())
            .unwrap();
        let session = pipeline.identity.create_session(owner.id, owner.role, None, None).unwrap();

        let meta = RequestMeta {
            session_cookie: Some(session.id.to_string()),
            ..Default::default()
        };
        let ctx = pipeline.build_context(&meta).unwrap();
        assert_eq!(ctx.user.role, Role::Owner);
        assert_eq!(ctx.user.username.as_deref(), Some("alice"));
        assert!(ctx.user.profile_root.is_some());
        assert!(ctx.is_authenticated());
    }

    #[test]
    fn public_read_gate_allows_anonymous() {
        let (_dir, pipeline) = pipeline();
        let ctx = UserContext::anonymous(pipeline.mode.snapshot());
        assert!(pipeline.authorize(&ctx, AuthGate::PublicRead).is_ok());
    }

    #[test]
    fn authenticated_gate_denies_anonymous_with_401_kind() {
        let (_dir, pipeline) = pipeline();
        let ctx = UserContext::anonymous(pipeline.mode.snapshot());
        let err = pipeline.authorize(&ctx, AuthGate::Authenticated).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }

    #[test]
    fn owner_only_gate_denies_standard_with_403_kind() {
        let (_dir, pipeline) = pipeline();
        let snapshot = pipeline.mode.snapshot();
        let ctx = UserContext::authenticated(
            mh_core::UserId::new(),
            "bob",
            Role::Standard,
            std::path::PathBuf::from("/tmp/bob"),
            snapshot,
        );
        let err = pipeline.authorize(&ctx, AuthGate::OwnerOnly).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn requires_write_mode_gate_denies_under_emulation() {
        let (_dir, pipeline) = pipeline();
        pipeline.mode.set(mh_core::CognitiveMode::Emulation).unwrap();
        let snapshot = pipeline.mode.snapshot();
        let ctx = UserContext::authenticated(
            mh_core::UserId::new(),
            "alice",
            Role::Owner,
            std::path::PathBuf::from("/tmp/alice"),
            snapshot,
        );
        let err = pipeline.authorize(&ctx, AuthGate::RequiresWriteMode).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
