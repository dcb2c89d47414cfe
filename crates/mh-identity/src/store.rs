//! The identity store: users, sessions, and recovery codes (spec §4.A).

use std::collections::HashMap;

use chrono::Utc;
use mh_core::{AppRoot, CognitiveMode, Role, SessionId, UserId};
use mh_crypto::{generate_recovery_code, PasswordHash};
use mh_storage::JsonDocument;
use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, IdentityResult};
use crate::types::{RecoveryCode, Session, StoredHash, User, UserMetadata, UserRecord};

/// `^[A-Za-z0-9_-]{3,50}$` without pulling in a regex engine for one
/// character class.
fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (3..=50).contains(&len)
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// `users.json` document shape: username → record.
#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    #[serde(default)]
    by_username: HashMap<String, UserRecord>,
}

/// `sessions.json` document shape: session id (as string) → session.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionsFile {
    #[serde(default)]
    by_id: HashMap<String, Session>,
}

/// File-backed identity & session store. One instance per process,
/// shared behind an `Arc` by callers (it is internally lock-per-file, so
/// cloning the handle is cheap and safe).
#[derive(Clone)]
pub struct IdentityStore {
    users: std::sync::Arc<JsonDocument<UsersFile>>,
    sessions: std::sync::Arc<JsonDocument<SessionsFile>>,
}

impl IdentityStore {
    /// Bind to the user/session documents under an [`AppRoot`].
    #[must_use]
    pub fn new(app_root: &AppRoot) -> Self {
        Self {
            users: std::sync::Arc::new(JsonDocument::new(app_root.users_file())),
            sessions: std::sync::Arc::new(JsonDocument::new(app_root.sessions_file())),
        }
    }

    /// True if no user has been registered yet (spec §4.A: "the first
    /// successful `createUser` receives role `owner`").
    pub fn is_empty(&self) -> IdentityResult<bool> {
        Ok(self.users.load()?.by_username.is_empty())
    }

    /// Register a new user. The very first user in the store becomes
    /// `owner` regardless of the requested role; every later registration
    /// keeps the requested role (spec §4.A).
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        requested_role: Role,
        metadata: UserMetadata,
    ) -> IdentityResult<User> {
        if !is_valid_username(username) {
            return Err(IdentityError::InvalidUsername(username.to_string()));
        }
        let hash = PasswordHash::new(password).map_err(|e| IdentityError::WeakPassword(e.to_string()))?;

        const TAKEN_MARKER: &str = "__username_taken__";
        let file = self.users.try_update(|mut file| {
            if file.by_username.contains_key(username) {
                return Err(mh_storage::StorageError::Lock(TAKEN_MARKER.to_string()));
            }
            let role = if file.by_username.is_empty() {
                Role::Owner
            } else {
                requested_role
            };
            let user = User {
                id: UserId::new(),
                username: username.to_string(),
                password_hash: StoredHash::from_hash(&hash),
                role,
                created_at: Utc::now(),
                metadata,
            };
            file.by_username.insert(
                username.to_string(),
                UserRecord {
                    user,
                    recovery_codes: Vec::new(),
                },
            );
            Ok(file)
        });

        match file {
            Ok(file) => Ok(file
                .by_username
                .get(username)
                .expect("just inserted")
                .user
                .clone()),
            Err(mh_storage::StorageError::Lock(msg)) if msg == TAKEN_MARKER => {
                Err(IdentityError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verify credentials, constant-time on the password comparison.
    pub fn authenticate(&self, username: &str, password: &str) -> IdentityResult<Option<User>> {
        let file = self.users.load()?;
        let Some(record) = file.by_username.get(username) else {
            // Still run a hash derivation so the timing of "no such user"
            // and "wrong password" is indistinguishable.
            let _ = PasswordHash::new("placeholder-password");
            return Ok(None);
        };
        let hash = record
            .user
            .password_hash
            .to_hash()
            .map_err(|_| IdentityError::UserNotFound(username.to_string()))?;
        if hash.verify(password) {
            Ok(Some(record.user.clone()))
        } else {
            Ok(None)
        }
    }

    /// Look up a user by id.
    pub fn get_user(&self, id: UserId) -> IdentityResult<Option<User>> {
        let file = self.users.load()?;
        Ok(file
            .by_username
            .values()
            .find(|r| r.user.id == id)
            .map(|r| r.user.clone()))
    }

    /// Look up a user by username.
    pub fn get_user_by_username(&self, username: &str) -> IdentityResult<Option<User>> {
        let file = self.users.load()?;
        Ok(file.by_username.get(username).map(|r| r.user.clone()))
    }

    /// List every registered user. Used by `/api/profiles/list`, which
    /// filters the result by visibility/role at the call site.
    pub fn list_users(&self) -> IdentityResult<Vec<User>> {
        let file = self.users.load()?;
        Ok(file.by_username.values().map(|r| r.user.clone()).collect())
    }

    /// Persist a change to an existing user (e.g. `metadata.profile_path`).
    pub fn update_user(&self, user: &User) -> IdentityResult<()> {
        self.users.try_update(|mut file| {
            let Some(record) = file.by_username.get_mut(&user.username) else {
                return Err(mh_storage::StorageError::NotFound(user.username.clone()));
            };
            record.user = user.clone();
            Ok(file)
        })?;
        Ok(())
    }

    /// Delete a user and cascade to its sessions (spec §3). Does not
    /// remove the profile directory — that is `mh-router`'s job, driven
    /// by the caller after this returns.
    pub fn delete_user(&self, id: UserId) -> IdentityResult<()> {
        let username = self
            .get_user(id)?
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))?
            .username;

        self.users.update(|mut file| {
            file.by_username.remove(&username);
            file
        })?;
        self.sessions.update(|mut file| {
            file.by_id.retain(|_, s| s.user_id != id);
            file
        })?;
        Ok(())
    }

    /// Create a session with a role-bounded expiry (spec §3).
    pub fn create_session(
        &self,
        user_id: UserId,
        role: Role,
        user_agent: Option<String>,
        ip: Option<String>,
    ) -> IdentityResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: SessionId::new(),
            user_id,
            role,
            created_at: now,
            expires_at: now + Session::max_duration(role),
            user_agent,
            ip,
            metadata: crate::types::SessionMetadata::default(),
        };
        self.sessions.update(|mut file| {
            file.by_id.insert(session.id.to_string(), session.clone());
            file
        })?;
        Ok(session)
    }

    /// Validate a session id, lazily deleting it if expired (spec §4.A,
    /// §8 invariant 4).
    pub fn validate_session(&self, id: SessionId) -> IdentityResult<Option<Session>> {
        let key = id.to_string();
        let now = Utc::now();
        let result = std::cell::RefCell::new(None);
        self.sessions.update(|mut file| {
            match file.by_id.get(&key) {
                Some(session) if !session.is_expired(now) => {
                    *result.borrow_mut() = Some(session.clone());
                }
                Some(_) => {
                    file.by_id.remove(&key);
                }
                None => {}
            }
            file
        })?;
        Ok(result.into_inner())
    }

    /// Delete a session (logout).
    pub fn delete_session(&self, id: SessionId) -> IdentityResult<()> {
        self.sessions.update(|mut file| {
            file.by_id.remove(&id.to_string());
            file
        })?;
        Ok(())
    }

    /// The cognitive mode a session's role pins, if any (spec §4.C:
    /// guests/anonymous are always `emulation`).
    #[must_use]
    pub fn pinned_mode(role: Role) -> Option<CognitiveMode> {
        crate::types::pinned_mode_for_role(role)
    }

    /// Generate a batch of one-shot recovery codes, hashing each at rest.
    /// Returns the plaintext codes — shown to the caller exactly once.
    pub fn generate_recovery_codes(&self, user_id: UserId, count: usize) -> IdentityResult<Vec<String>> {
        let username = self
            .get_user(user_id)?
            .ok_or_else(|| IdentityError::UserNotFound(user_id.to_string()))?
            .username;

        let mut plaintext = Vec::with_capacity(count);
        let mut hashed = Vec::with_capacity(count);
        for _ in 0..count {
            let code = generate_recovery_code();
            let hash = PasswordHash::new(&code).expect("recovery codes exceed the minimum length");
            hashed.push(RecoveryCode {
                hash: StoredHash::from_hash(&hash),
                used_at: None,
            });
            plaintext.push(code);
        }

        self.users.try_update(|mut file| {
            let Some(record) = file.by_username.get_mut(&username) else {
                return Err(mh_storage::StorageError::NotFound(username.clone()));
            };
            record.recovery_codes = hashed.clone();
            Ok(file)
        })?;

        Ok(plaintext)
    }

    /// Consume a recovery code for `username`. Codes are single-use: once
    /// `used_at` is set, the same code is rejected on a later attempt.
    /// Matching codes are kept (not deleted) so the audit trail of usage
    /// survives (spec-full §10.E).
    pub fn consume_recovery_code(&self, username: &str, code: &str) -> IdentityResult<User> {
        let now = Utc::now();
        const INVALID_MARKER: &str = "__invalid_recovery_code__";
        let outcome = std::cell::RefCell::new(None);
        let result = self.users.try_update(|mut file| {
            let Some(record) = file.by_username.get_mut(username) else {
                return Err(mh_storage::StorageError::Lock(INVALID_MARKER.to_string()));
            };
            let matched = record.recovery_codes.iter_mut().find(|rc| {
                rc.used_at.is_none()
                    && rc
                        .hash
                        .to_hash()
                        .map(|h| h.verify(code))
                        .unwrap_or(false)
            });
            match matched {
                Some(rc) => {
                    rc.used_at = Some(now);
                    *outcome.borrow_mut() = Some(record.user.clone());
                    Ok(file)
                }
                None => Err(mh_storage::StorageError::Lock(INVALID_MARKER.to_string())),
            }
        });

        match result {
            Ok(_) => outcome.into_inner().ok_or(IdentityError::InvalidRecoveryCode),
            Err(mh_storage::StorageError::Lock(msg)) if msg == INVALID_MARKER => {
                Err(IdentityError::InvalidRecoveryCode)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, IdentityStore) {
        let dir = tempfile::tempdir().unwrap();
        let app_root = AppRoot::at(dir.path());
        app_root.ensure().unwrap();
        let store = IdentityStore::new(&app_root);
        (dir, store)
    }

    #[test]
    fn first_user_becomes_owner_second_becomes_requested_role() {
        let (_dir, store) = store();
        let alice = store
            .create_user("alice", "correct-horse", Role::Standard, UserMetadata::default())
            .unwrap();
        assert_eq!(alice.role, Role::Owner);

        let bob = store
            .create_user("bob", "battery-staple", Role::Standard, UserMetadata::default())
            .unwrap();
        assert_eq!(bob.role, Role::Standard);
    }

    #[test]
    fn duplicate_username_rejected() {
        let (_dir, store) = store();
        store
            .create_user("alice", "correct-horse", Role::Standard, UserMetadata::default())
            .unwrap();
        let result = store.create_user("alice", "another-pw", Role::Standard, UserMetadata::default());
        assert!(matches!(result, Err(IdentityError::UsernameTaken)));
    }

    #[test]
    fn invalid_username_rejected() {
        let (_dir, store) = store();
        let result = store.create_user("a", "correct-horse", Role::Standard, UserMetadata::default());
        assert!(matches!(result, Err(IdentityError::InvalidUsername(_))));
    }

    #[test]
    fn authenticate_rejects_wrong_password() {
        let (_dir, store) = store();
        store
            .create_user("alice", "correct-horse", Role::Standard, UserMetadata::default())
            .unwrap();
        assert!(store.authenticate("alice", "wrong").unwrap().is_none());
        assert!(store.authenticate("alice", "correct-horse").unwrap().is_some());
    }

    #[test]
    fn session_expires_and_is_lazily_collected() {
        let (_dir, store) = store();
        let alice = store
            .create_user("alice", "correct-horse", Role::Owner, UserMetadata::default())
            .unwrap();
        let session = store
            .create_session(alice.id, Role::Owner, None, None)
            .unwrap();

        // Force expiry by writing an already-expired session directly.
        store
            .sessions
            .update(|mut file| {
                if let Some(s) = file.by_id.get_mut(&session.id.to_string()) {
                    s.expires_at = Utc::now() - chrono::Duration::seconds(1);
                }
                file
            })
            .unwrap();

        assert!(store.validate_session(session.id).unwrap().is_none());
        // Lazily deleted: a second lookup still returns None, not an error.
        assert!(store.validate_session(session.id).unwrap().is_none());
    }

    #[test]
    fn recovery_code_is_single_use() {
        let (_dir, store) = store();
        let alice = store
            .create_user("alice", "correct-horse", Role::Owner, UserMetadata::default())
            .unwrap();
        let codes = store.generate_recovery_codes(alice.id, 3).unwrap();
        assert_eq!(codes.len(), 3);

        let user = store.consume_recovery_code("alice", &codes[0]).unwrap();
        assert_eq!(user.username, "alice");

        let result = store.consume_recovery_code("alice", &codes[0]);
        assert!(matches!(result, Err(IdentityError::InvalidRecoveryCode)));

        // A different unused code still works.
        store.consume_recovery_code("alice", &codes[1]).unwrap();
    }

    #[test]
    fn delete_user_cascades_sessions() {
        let (_dir, store) = store();
        let alice = store
            .create_user("alice", "correct-horse", Role::Owner, UserMetadata::default())
            .unwrap();
        let session = store
            .create_session(alice.id, Role::Owner, None, None)
            .unwrap();

        store.delete_user(alice.id).unwrap();

        assert!(store.get_user(alice.id).unwrap().is_none());
        assert!(store.validate_session(session.id).unwrap().is_none());
    }
}
