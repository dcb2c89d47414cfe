//! Durable audit log for the request pipeline (spec §4.D step 5).
//!
//! Every request-pipeline completion emits one `category=action` or
//! `category=security` record containing `{event, actor, details}` —
//! never a password or session id. Records are appended to a per-UTC-date
//! NDJSON file under `logs/audit/` and hash-chained so a tampered or
//! reordered entry is detectable.
//!
//! Reworked from the teacher's ed25519-signed, `SurrealKV`-backed audit
//! chain: this system has no distributed trust boundary between the
//! signer and the verifier (both are the same process), so a content
//! hash chain gives the same tamper-evidence without a runtime keypair.
//!
//! # Example
//!
//! ```
//! use mh_audit::{Actor, AuditLog};
//! use mh_core::{Role, UserId};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let log = AuditLog::new(dir.path());
//!
//! log.record_action(
//!     "profile.write",
//!     Actor::user(UserId::new(), Role::Owner),
//!     serde_json::json!({"path": "persona/core.json"}),
//! ).unwrap();
//!
//! let today = chrono::Utc::now().date_naive();
//! assert!(log.verify_chain(today).is_ok());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod entry;
mod error;
mod log;

pub use entry::{Actor, AuditEntry, Category, Level};
pub use error::{AuditError, AuditResult};
pub use log::AuditLog;
