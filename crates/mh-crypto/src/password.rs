//! Password and recovery-code hashing.
//!
//! Used by `mh-identity` for `User.passwordHash` / `passwordSalt` (spec
//! §3, §4.A) and for hashing recovery codes at rest. PBKDF2-HMAC-SHA512
//! is shared with the encryption subsystem's key derivation (`cipher.rs`)
//! so the crate has one KDF, not two.

use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::RngCore;
use sha2::Sha512;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};

/// Iteration count for password hashing (spec §4.E pins 100,000 for the
/// profile-encryption KDF; reused here for consistency).
pub const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 64;

/// Minimum password length (spec §4.A `WEAK_PASSWORD`).
pub const MIN_PASSWORD_LEN: usize = 6;

/// A salted PBKDF2-HMAC-SHA512 password hash, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl PasswordHash {
    /// Hash a plaintext password with a freshly generated random salt.
    ///
    /// # Errors
    /// Returns [`CryptoError::WeakPassword`] if shorter than
    /// [`MIN_PASSWORD_LEN`].
    pub fn new(password: &str) -> CryptoResult<Self> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(CryptoError::WeakPassword(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let mut salt = vec![0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        Ok(Self::derive(password, salt))
    }

    /// Rebuild a `PasswordHash` from its persisted salt and hash bytes.
    #[must_use]
    pub fn from_parts(salt: Vec<u8>, hash: Vec<u8>) -> Self {
        Self { salt, hash }
    }

    fn derive(password: &str, salt: Vec<u8>) -> Self {
        let mut out = Zeroizing::new([0u8; HASH_LEN]);
        pbkdf2::<Hmac<Sha512>>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, out.as_mut())
            .expect("pbkdf2 output length is valid for HMAC-SHA512");
        Self {
            salt,
            hash: out.to_vec(),
        }
    }

    /// Constant-time comparison against a candidate plaintext password.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        let candidate_hash = Self::derive(candidate, self.salt.clone());
        bool::from(self.hash.ct_eq(&candidate_hash.hash))
    }

    /// The random salt, for persistence.
    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// The derived hash bytes, for persistence.
    #[must_use]
    pub fn hash_bytes(&self) -> &[u8] {
        &self.hash
    }
}

/// Generate a one-shot recovery code (spec §4.A `generateRecoveryCodes`):
/// a human-typeable string, not meant to be hashed the same way a
/// long-lived password is — but stored the same way (hashed, never
/// plaintext) via [`PasswordHash::new`].
#[must_use]
pub fn generate_recovery_code() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut bytes = [0u8; 10];
    rand::rng().fill_bytes(&mut bytes);
    let chars: String = bytes
        .iter()
        .map(|b| ALPHABET[(*b as usize) % ALPHABET.len()] as char)
        .collect();
    format!("{}-{}", &chars[..5], &chars[5..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_correct_password_rejects_wrong() {
        let hash = PasswordHash::new("correct-horse").unwrap();
        assert!(hash.verify("correct-horse"));
        assert!(!hash.verify("wrong-password"));
    }

    #[test]
    fn rejects_short_passwords() {
        assert!(matches!(
            PasswordHash::new("abc"),
            Err(CryptoError::WeakPassword(_))
        ));
    }

    #[test]
    fn from_parts_roundtrips_verification() {
        let hash = PasswordHash::new("battery-staple").unwrap();
        let rebuilt = PasswordHash::from_parts(hash.salt().to_vec(), hash.hash_bytes().to_vec());
        assert!(rebuilt.verify("battery-staple"));
    }

    #[test]
    fn recovery_codes_are_unique_and_formatted() {
        let a = generate_recovery_code();
        let b = generate_recovery_code();
        assert_ne!(a, b);
        assert_eq!(a.len(), 11);
        assert!(a.contains('-'));
    }
}
