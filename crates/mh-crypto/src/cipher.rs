//! AES-256-GCM file encryption with a PBKDF2-HMAC-SHA512 derived key
//! (spec §4.E). Used by `mh-vault`'s profile encrypt/decrypt subsystem.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::RngCore;
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};

/// PBKDF2-HMAC-SHA512 iteration count, pinned by spec §4.E.
pub const KDF_ITERATIONS: u32 = 100_000;
/// Random salt length for per-profile key derivation, pinned by spec §4.E.
pub const SALT_LEN: usize = 32;
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// A derived AES-256 key, held only in memory and zeroized on drop.
pub struct ProfileKey(Zeroizing<[u8; KEY_LEN]>);

impl ProfileKey {
    /// Derive a key from a password and a (persisted, non-secret) salt.
    #[must_use]
    pub fn derive(password: &str, salt: &[u8]) -> Self {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2::<Hmac<Sha512>>(password.as_bytes(), salt, KDF_ITERATIONS, key.as_mut())
            .expect("pbkdf2 output length matches AES-256 key length");
        Self(key)
    }

    /// Generate a fresh random salt suitable for [`Self::derive`].
    #[must_use]
    pub fn random_salt() -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        salt
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new_from_slice(self.0.as_slice()).expect("key is exactly 32 bytes")
    }

    /// Encrypt a single file's plaintext, returning the on-disk layout
    /// `[nonce(12) | ciphertext | tag(16)]` (spec §4.E).
    pub fn encrypt_file(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher()
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: b"",
                },
            )
            .map_err(|e| CryptoError::CipherFailed(e.to_string()))?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a `[nonce(12) | ciphertext | tag(16)]` blob produced by
    /// [`Self::encrypt_file`]. Fails (without panicking) on a wrong key,
    /// truncated input, or tampered ciphertext — all surfaced the same
    /// way, by design, so a wrong password can't be distinguished from
    /// corruption.
    pub fn decrypt_file(&self, blob: &[u8]) -> CryptoResult<Vec<u8>> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::CipherFailed("ciphertext too short".into()));
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher()
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad: b"",
                },
            )
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_plaintext() {
        let salt = ProfileKey::random_salt();
        let key = ProfileKey::derive("hunter2", &salt);
        let plaintext = b"profile data, 20 bytes!!";
        let blob = key.encrypt_file(plaintext).unwrap();
        assert_eq!(key.decrypt_file(&blob).unwrap(), plaintext);
    }

    #[test]
    fn wrong_password_fails_without_panicking() {
        let salt = ProfileKey::random_salt();
        let key = ProfileKey::derive("hunter2", &salt);
        let blob = key.encrypt_file(b"secret").unwrap();

        let wrong_key = ProfileKey::derive("hunter3", &salt);
        let result = wrong_key.decrypt_file(&blob);
        assert!(matches!(result, Err(CryptoError::VerificationFailed)));
    }

    #[test]
    fn each_encryption_uses_a_fresh_nonce() {
        let salt = ProfileKey::random_salt();
        let key = ProfileKey::derive("hunter2", &salt);
        let a = key.encrypt_file(b"same plaintext").unwrap();
        let b = key.encrypt_file(b"same plaintext").unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
    }
}
