//! User, session, and recovery-code storage for the Metahost runtime
//! (spec §3, §4.A).
//!
//! This crate owns two files under the installation root's `etc/`
//! directory — `users.json` and `sessions.json` — and every
//! read-modify-write against them goes through `mh-storage`'s per-file
//! lock, so concurrent registrations and logins never race.
//!
//! # Example
//!
//! ```
//! use mh_core::{AppRoot, Role};
//! use mh_identity::{IdentityStore, UserMetadata};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let app_root = AppRoot::at(dir.path());
//! app_root.ensure().unwrap();
//! let store = IdentityStore::new(&app_root);
//!
//! let owner = store
//!     .create_user("alice", "correct-horse", Role::Standard, UserMetadata::default())
//!     .unwrap();
//! assert_eq!(owner.role, Role::Owner); // first user is always owner
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod store;
mod types;

pub use error::{IdentityError, IdentityResult};
pub use store::IdentityStore;
pub use types::{
    pinned_mode_for_role, ProfileVisibility, RecoveryCode, Session, SessionMetadata, StoredHash,
    User, UserMetadata, UserRecord,
};
