//! Per-profile encryption metadata and verification blob (spec §3
//! "Encryption Metadata", §4.E).

use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::{DateTime, Utc};
use mh_crypto::ProfileKey;
use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};

const METADATA_FILENAME: &str = ".mh-encryption.json";
const VERIFICATION_FILENAME: &str = ".mh-encryption.verify";
/// Fixed plaintext the verification blob decrypts to, so a candidate key
/// can be confirmed without touching any user file (spec §4.E).
const VERIFICATION_SENTINEL: &[u8] = b"metahost-profile-verification-sentinel";

/// How the profile's encryption key is supplied (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PasswordMode {
    /// A dedicated encryption password, distinct from the login password.
    Separate,
    /// The user's login password doubles as the encryption password,
    /// enabling `lockProfile`/`unlockProfile` (spec §4.E).
    LoginPassword,
}

/// The durable per-profile encryption metadata record (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    /// Schema version, for forward compatibility.
    pub version: u32,
    /// Always `"aes-256-gcm"`.
    pub algorithm: String,
    /// Always `"pbkdf2-sha512"`.
    pub kdf: String,
    /// PBKDF2 iteration count (spec §4.E pins 100,000).
    pub iterations: u32,
    /// Base64-encoded per-profile random salt.
    pub salt_b64: String,
    /// When the profile was first encrypted.
    pub created_at: DateTime<Utc>,
    /// Count of files encrypted in the run that created this record.
    pub encrypted_file_count: usize,
    /// How the key is supplied.
    pub password_mode: PasswordMode,
}

impl EncryptionMetadata {
    fn path(profile_root: &Path) -> PathBuf {
        profile_root.join(METADATA_FILENAME)
    }

    fn verification_path(profile_root: &Path) -> PathBuf {
        profile_root.join(VERIFICATION_FILENAME)
    }

    /// True if `profile_root` has already been encrypted.
    #[must_use]
    pub fn exists(profile_root: &Path) -> bool {
        Self::path(profile_root).is_file()
    }

    /// Load the metadata record, if present.
    ///
    /// # Errors
    /// Returns an error if the file exists but is not valid JSON.
    pub fn load(profile_root: &Path) -> VaultResult<Option<Self>> {
        Ok(mh_storage::read_json(&Self::path(profile_root))?)
    }

    /// Construct a fresh record plus the key used to derive it, and
    /// persist both the metadata and verification blob atomically.
    pub fn create(
        profile_root: &Path,
        password: &str,
        password_mode: PasswordMode,
        encrypted_file_count: usize,
    ) -> VaultResult<(Self, ProfileKey)> {
        let salt = ProfileKey::random_salt();
        let key = ProfileKey::derive(password, &salt);

        let metadata = Self {
            version: 1,
            algorithm: "aes-256-gcm".to_string(),
            kdf: "pbkdf2-sha512".to_string(),
            iterations: mh_crypto::KDF_ITERATIONS,
            salt_b64: base64::engine::general_purpose::STANDARD.encode(salt),
            created_at: Utc::now(),
            encrypted_file_count,
            password_mode,
        };

        let verification_blob = key.encrypt_file(VERIFICATION_SENTINEL)?;
        mh_storage::write_bytes(&Self::verification_path(profile_root), &verification_blob)?;
        mh_storage::write_json(&Self::path(profile_root), &metadata)?;

        Ok((metadata, key))
    }

    /// Update the stored file count after a run, without re-deriving the
    /// key or touching the verification blob.
    pub fn update_file_count(&self, profile_root: &Path, encrypted_file_count: usize) -> VaultResult<()> {
        let mut next = self.clone();
        next.encrypted_file_count = encrypted_file_count;
        mh_storage::write_json(&Self::path(profile_root), &next)?;
        Ok(())
    }

    /// Delete both the metadata and verification files (used once a
    /// profile has been fully decrypted back to plaintext).
    pub fn remove(profile_root: &Path) -> VaultResult<()> {
        for path in [Self::path(profile_root), Self::verification_path(profile_root)] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Re-derive the key for a candidate password and confirm it against
    /// the verification blob, without decrypting any user file (spec
    /// §4.E `verifyPassword`).
    pub fn verify_password(&self, profile_root: &Path, password: &str) -> VaultResult<Option<ProfileKey>> {
        let salt = base64::engine::general_purpose::STANDARD
            .decode(&self.salt_b64)
            .map_err(|e| {
                VaultError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?;
        let key = ProfileKey::derive(password, &salt);

        let blob = std::fs::read(Self::verification_path(profile_root))?;
        match key.decrypt_file(&blob) {
            Ok(plaintext) if plaintext == VERIFICATION_SENTINEL => Ok(Some(key)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_verify_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let (metadata, _key) =
            EncryptionMetadata::create(dir.path(), "hunter2", PasswordMode::Separate, 2).unwrap();

        assert!(EncryptionMetadata::exists(dir.path()));
        let loaded = EncryptionMetadata::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.encrypted_file_count, 2);

        assert!(metadata.verify_password(dir.path(), "hunter2").unwrap().is_some());
        assert!(metadata.verify_password(dir.path(), "wrong").unwrap().is_none());
    }

    #[test]
    fn remove_deletes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        EncryptionMetadata::create(dir.path(), "hunter2", PasswordMode::Separate, 0).unwrap();
        EncryptionMetadata::remove(dir.path()).unwrap();
        assert!(!EncryptionMetadata::exists(dir.path()));
    }
}
