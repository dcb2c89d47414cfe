//! Per-profile at-rest encryption subsystem (spec §4.E).
//!
//! PBKDF2-HMAC-SHA512 derives a per-profile AES-256-GCM key from a
//! password and a random salt (`mh-crypto`); this crate owns the
//! metadata/verification-blob shape, the encrypt/decrypt directory
//! walks with streamed progress, and the per-session key cache behind
//! `lockProfile`/`unlockProfile`.
//!
//! # Example
//!
//! ```no_run
//! use mh_vault::{encrypt_profile, metadata::PasswordMode};
//!
//! # async fn example() {
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::create_dir_all(dir.path().join("persona")).unwrap();
//! std::fs::write(dir.path().join("persona/core.json"), b"hello").unwrap();
//!
//! let (tx, mut rx) = tokio::sync::mpsc::channel(16);
//! let handle = tokio::spawn(encrypt_profile(
//!     dir.path().to_path_buf(),
//!     "hunter2".to_string(),
//!     PasswordMode::Separate,
//!     tx,
//! ));
//! while rx.recv().await.is_some() {}
//! handle.await.unwrap().unwrap();
//! assert!(dir.path().join("persona/core.json.enc").exists());
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod decrypt;
mod encrypt;
mod error;
mod key_cache;
pub mod metadata;
pub mod progress;

pub use decrypt::{decrypt_profile, verify_password};
pub use encrypt::encrypt_profile;
pub use error::{VaultError, VaultResult};
pub use key_cache::KeyCache;
pub use metadata::EncryptionMetadata;
