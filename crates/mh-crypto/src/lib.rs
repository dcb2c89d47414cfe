//! Cryptographic primitives for the Metahost multi-tenant agent runtime.
//!
//! This crate provides:
//! - PBKDF2-HMAC-SHA512 password hashing (spec §4.A) and recovery codes
//! - The same KDF plus AES-256-GCM file encryption for the per-profile
//!   at-rest encryption subsystem (spec §4.E)
//! - BLAKE3 content hashing for the audit hash chain (spec §4.D step 5)
//!
//! # Example
//!
//! ```
//! use mh_crypto::{PasswordHash, ContentHash};
//!
//! let hash = PasswordHash::new("correct-horse").unwrap();
//! assert!(hash.verify("correct-horse"));
//! assert!(!hash.verify("wrong"));
//!
//! let digest = ContentHash::hash(b"audit entry bytes");
//! println!("{}", digest.to_hex());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod cipher;
mod error;
mod hash;
mod password;

pub use cipher::{ProfileKey, KDF_ITERATIONS, SALT_LEN};
pub use error::{CryptoError, CryptoResult};
pub use hash::ContentHash;
pub use password::{generate_recovery_code, PasswordHash, MIN_PASSWORD_LEN};
