//! Audit entry shape (spec §4.D step 5: `{event, actor, details}`).
//!
//! Entries are chain-linked: each carries the content hash of the entry
//! that preceded it in the same day's file, so a tampered or reordered
//! entry breaks the chain and [`crate::AuditLog::verify_chain`] detects it.

use chrono::{DateTime, Utc};
use mh_core::{Role, UserId};
use mh_crypto::ContentHash;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the two record kinds named in spec §4.D step 5 this entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// A handler completed a request-pipeline operation.
    Action,
    /// A policy denial, failed authentication, or other security-relevant
    /// event.
    Security,
}

/// Severity of the outcome being recorded (spec §7: "Audit logs capture
/// every non-success outcome with `level ∈ {info, warn, error}`").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Routine, successful completion.
    Info,
    /// A denial or validation failure a client is expected to see.
    Warn,
    /// An unexpected or internal failure.
    Error,
}

/// Who performed the audited action. Deliberately excludes the session
/// id (spec §4.D step 5: "never include passwords or session ids").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// The authenticated user, if any (`None` for anonymous callers).
    pub user_id: Option<UserId>,
    /// The role the request was evaluated under.
    pub role: Option<Role>,
}

impl Actor {
    /// An actor with no authenticated user (anonymous/guest request).
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            role: None,
        }
    }

    /// An actor identified by user id and role.
    #[must_use]
    pub fn user(user_id: UserId, role: Role) -> Self {
        Self {
            user_id: Some(user_id),
            role: Some(role),
        }
    }
}

/// A single durable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// When this entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// `action` or `security`.
    pub category: Category,
    /// `info`, `warn`, or `error`.
    pub level: Level,
    /// Short, stable event name, e.g. `"profile.write"` or `"auth.denied"`.
    pub event: String,
    /// Who performed the action.
    pub actor: Actor,
    /// Free-form structured detail. Callers must not put passwords or
    /// session ids here either.
    pub details: serde_json::Value,
    /// Content hash of the entry preceding this one in the same day's
    /// file, or [`ContentHash::zero`] for the first entry of the day.
    pub previous_hash: ContentHash,
}

impl AuditEntry {
    /// Construct a new entry chained onto `previous_hash`.
    #[must_use]
    pub fn new(
        category: Category,
        level: Level,
        event: impl Into<String>,
        actor: Actor,
        details: serde_json::Value,
        previous_hash: ContentHash,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            category,
            level,
            event: event.into(),
            actor,
            details,
            previous_hash,
        }
    }

    /// Content hash of this entry, used as the `previous_hash` of the
    /// next entry in the chain.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        // Serialize deterministically: serde_json preserves struct field
        // order, which matches declaration order above.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        ContentHash::hash_with_domain("mh-audit-entry", &bytes)
    }

    /// Whether this entry correctly follows `previous` in the chain.
    #[must_use]
    pub fn follows(&self, previous: &AuditEntry) -> bool {
        self.previous_hash == previous.content_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_linking_detects_correct_and_incorrect_order() {
        let first = AuditEntry::new(
            Category::Action,
            Level::Info,
            "profile.write",
            Actor::user(UserId::new(), Role::Owner),
            serde_json::json!({"path": "persona/core.json"}),
            ContentHash::zero(),
        );
        let second = AuditEntry::new(
            Category::Action,
            Level::Info,
            "profile.write",
            Actor::user(UserId::new(), Role::Owner),
            serde_json::json!({"path": "etc/voice.json"}),
            first.content_hash(),
        );

        assert!(second.follows(&first));
        assert!(!first.follows(&second));
    }

    #[test]
    fn anonymous_actor_carries_no_user_id() {
        let actor = Actor::anonymous();
        assert!(actor.user_id.is_none());
        assert!(actor.role.is_none());
    }

    #[test]
    fn entry_serializes_without_session_id_field() {
        let entry = AuditEntry::new(
            Category::Security,
            Level::Warn,
            "auth.denied",
            Actor::anonymous(),
            serde_json::json!({"reason": "expired session"}),
            ContentHash::zero(),
        );
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("session"));
    }
}
