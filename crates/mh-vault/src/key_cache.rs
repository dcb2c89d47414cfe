//! Per-session cached encryption key (spec §4.E
//! `lockProfile`/`unlockProfile`, §9 "Encryption key lifetime").
//!
//! Only meaningful when a profile's `passwordMode` is `loginPassword`:
//! the derived key is cached in memory for the session so later
//! requests don't need the password again, and is cleared on logout,
//! timeout, or an explicit lock call. Keys never touch disk and the
//! cache never logs a key.

use std::collections::HashMap;
use std::sync::Arc;

use mh_core::UserId;
use mh_crypto::ProfileKey;
use tokio::sync::RwLock;

use crate::error::{VaultError, VaultResult};
use crate::metadata::{EncryptionMetadata, PasswordMode};

/// Per-process, per-user cache of unlocked profile keys. Cheaply
/// cloneable; every clone shares the same underlying map.
#[derive(Clone, Default)]
pub struct KeyCache {
    inner: Arc<RwLock<HashMap<UserId, ProfileKey>>>,
}

impl KeyCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive and cache the key for `user_id`, provided the profile's
    /// `passwordMode` is `loginPassword` (spec §4.E).
    ///
    /// # Errors
    /// Returns [`VaultError::NotLoginPasswordMode`] if the profile uses a
    /// separate encryption password, [`VaultError::NotEncrypted`] if the
    /// profile has no metadata, or [`VaultError::WrongPassword`] if the
    /// password doesn't verify.
    pub async fn unlock(
        &self,
        user_id: UserId,
        profile_root: &std::path::Path,
        password: &str,
    ) -> VaultResult<()> {
        let Some(metadata) = EncryptionMetadata::load(profile_root)? else {
            return Err(VaultError::NotEncrypted);
        };
        if metadata.password_mode != PasswordMode::LoginPassword {
            return Err(VaultError::NotLoginPasswordMode);
        }
        let Some(key) = metadata.verify_password(profile_root, password)? else {
            return Err(VaultError::WrongPassword);
        };
        self.inner.write().await.insert(user_id, key);
        Ok(())
    }

    /// Clear the cached key for `user_id` (logout, idle timeout, or an
    /// explicit lock request).
    pub async fn lock(&self, user_id: UserId) {
        self.inner.write().await.remove(&user_id);
    }

    /// True if a key is currently cached for `user_id`.
    pub async fn is_unlocked(&self, user_id: UserId) -> bool {
        self.inner.read().await.contains_key(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unlock_requires_login_password_mode() {
        let dir = tempfile::tempdir().unwrap();
        EncryptionMetadata::create(dir.path(), "hunter2", PasswordMode::Separate, 0).unwrap();

        let cache = KeyCache::new();
        let user = UserId::new();
        let result = cache.unlock(user, dir.path(), "hunter2").await;
        assert!(matches!(result, Err(VaultError::NotLoginPasswordMode)));
    }

    #[tokio::test]
    async fn unlock_then_lock_clears_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        EncryptionMetadata::create(dir.path(), "hunter2", PasswordMode::LoginPassword, 0).unwrap();

        let cache = KeyCache::new();
        let user = UserId::new();
        cache.unlock(user, dir.path(), "hunter2").await.unwrap();
        assert!(cache.is_unlocked(user).await);

        cache.lock(user).await;
        assert!(!cache.is_unlocked(user).await);
    }
}
