//! Data model for spec §3: `User`, `Session`, and recovery codes.

use chrono::{DateTime, Duration, Utc};
use mh_core::{CognitiveMode, Role, SessionId, UserId};
use mh_crypto::PasswordHash;
use serde::{Deserialize, Serialize};

/// Profile visibility, controlling whether anonymous callers may see the
/// profile in `/api/profiles/list` (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileVisibility {
    /// Visible to anonymous `/api/profiles/list` callers.
    Public,
    /// Visible only to authenticated callers.
    Private,
}

/// `User.metadata` (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Display name shown in the UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Contact email, used by `/api/auth/reset-password` flows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Defaults to `private`; only `public` entries appear to anonymous
    /// `/api/profiles/list` callers.
    #[serde(default = "default_visibility")]
    pub profile_visibility: ProfileVisibility,
    /// A user-chosen absolute profile root, validated by `mh-router`
    /// before use. `None` means "use the default path under the
    /// installation root".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
}

fn default_visibility() -> ProfileVisibility {
    ProfileVisibility::Private
}

impl Default for ProfileVisibility {
    fn default() -> Self {
        Self::Private
    }
}

/// A registered user (spec §3). `password_hash`/`password_salt` in the
/// spec's field list collapse into [`PasswordHash`], which already
/// bundles a salt with its digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier.
    pub id: UserId,
    /// Unique, matches `^[A-Za-z0-9_-]{3,50}$`.
    pub username: String,
    /// Salted PBKDF2-HMAC-SHA512 hash; plaintext is never stored.
    pub password_hash: StoredHash,
    /// Authorization role.
    pub role: Role,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Free-form profile metadata.
    #[serde(default)]
    pub metadata: UserMetadata,
}

/// The two byte vectors of a [`PasswordHash`], in a serializable shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredHash {
    /// Base64-encoded salt.
    pub salt_b64: String,
    /// Base64-encoded digest.
    pub hash_b64: String,
}

impl StoredHash {
    /// Capture a freshly computed [`PasswordHash`] for storage.
    #[must_use]
    pub fn from_hash(hash: &PasswordHash) -> Self {
        use base64::Engine;
        let engine = base64::engine::general_purpose::STANDARD;
        Self {
            salt_b64: engine.encode(hash.salt()),
            hash_b64: engine.encode(hash.hash_bytes()),
        }
    }

    /// Rebuild a verifiable [`PasswordHash`] from storage.
    ///
    /// # Errors
    /// Returns an error if either field is not valid base64.
    pub fn to_hash(&self) -> Result<PasswordHash, base64::DecodeError> {
        use base64::Engine;
        let engine = base64::engine::general_purpose::STANDARD;
        let salt = engine.decode(&self.salt_b64)?;
        let hash = engine.decode(&self.hash_b64)?;
        Ok(PasswordHash::from_parts(salt, hash))
    }
}

/// `Session.metadata` (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// The profile currently active for this session, if it differs from
    /// the owning user's default (rare; mostly unused outside merges).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_profile: Option<String>,
    /// Set when a session was established by merging from another profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_profile: Option<String>,
    /// Profiles merged into this session, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_profiles: Vec<String>,
}

/// A live or expired session (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identifier; the value stored in the `mh_session` cookie.
    pub id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// The role captured at session-creation time.
    pub role: Role,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Expiry, bounded by role (spec §3): owner/standard ≤ 24h, guest ≤ 1h.
    pub expires_at: DateTime<Utc>,
    /// Client user agent, if supplied at login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Client IP, if supplied at login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Free-form session metadata.
    #[serde(default)]
    pub metadata: SessionMetadata,
}

impl Session {
    /// The maximum session lifetime for a role (spec §3). Anonymous
    /// sessions are never persisted, but the bound is listed here too
    /// since `mh-pipeline` consults it when deciding how long to treat a
    /// lazily-assigned anonymous context as valid.
    #[must_use]
    pub fn max_duration(role: Role) -> Duration {
        match role {
            Role::Owner | Role::Standard => Duration::hours(24),
            Role::Guest => Duration::hours(1),
            Role::Anonymous => Duration::minutes(30),
        }
    }

    /// True once `now` has passed `expires_at` (spec §3, §8 invariant 4).
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// One hashed, single-use recovery code (spec §4.A
/// `generateRecoveryCodes`/`consumeRecoveryCode`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryCode {
    /// Hash of the code; the plaintext is returned once at generation
    /// time and never stored.
    pub hash: StoredHash,
    /// Set the first time the code is successfully consumed. Consumed
    /// codes are kept (not deleted) so an audit trail of recovery-code
    /// usage survives (spec-full §10.E).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

/// The durable record for one user's identity data: the user itself plus
/// its recovery codes. One of these lives per username in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// The user.
    pub user: User,
    /// Outstanding and consumed recovery codes.
    #[serde(default)]
    pub recovery_codes: Vec<RecoveryCode>,
}

/// The cognitive mode pinned for a role, independent of the process-wide
/// mode (spec §4.C: "Guest sessions are permanently pinned to emulation").
#[must_use]
pub fn pinned_mode_for_role(role: Role) -> Option<CognitiveMode> {
    match role {
        Role::Guest | Role::Anonymous => Some(CognitiveMode::Emulation),
        Role::Owner | Role::Standard => None,
    }
}
