//! Durable JSON/NDJSON file persistence for the Metahost workspace.
//!
//! Spec §6's durable layout is plain files under each profile root and
//! the installation root — not an embedded database. This crate provides
//! the one mechanism every higher crate builds persistence on:
//!
//! - [`atomic`] — write-to-temp, `fsync`, rename; never a half-written file
//! - [`lock`] — per-file exclusive advisory locks (spec §5 single-writer)
//! - [`document`] — a JSON document combining both, for `mh-identity`'s
//!   user/session store, `mh-agents`' registry mirror, and `mh-config`

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod atomic;
pub mod document;
pub mod error;
pub mod lock;

pub use atomic::{read_json, write_bytes, write_json};
pub use document::JsonDocument;
pub use error::{StorageError, StorageResult};
pub use lock::FileLock;
