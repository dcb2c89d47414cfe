//! The Request Pipeline (spec §4.D): the one place every inbound HTTP
//! request passes through on its way from a raw cookie to a handler and
//! back out to the audit log.
//!
//! `mh-server` owns the Axum routing table; this crate owns what happens
//! between "a request arrived" and "a handler may run" — resolving the
//! session cookie against [`mh_identity::IdentityStore`], building the
//! [`mh_core::UserContext`] every handler receives, checking the route's
//! declared [`AuthGate`] against [`mh_policy::check`], and recording the
//! outcome through [`mh_audit::AuditLog`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use mh_core::{AppRoot, CognitiveModeCell};
//! use mh_identity::IdentityStore;
//! use mh_audit::AuditLog;
//! use mh_pipeline::{AuthGate, Pipeline, RequestMeta};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let app_root = AppRoot::at(dir.path());
//! app_root.ensure().unwrap();
//!
//! let pipeline = Pipeline::new(
//!     IdentityStore::new(&app_root),
//!     app_root.clone(),
//!     Arc::new(CognitiveModeCell::new(false)),
//!     AuditLog::new(app_root.system_logs_dir().join("audit")),
//! );
//!
//! let ctx = pipeline.build_context(&RequestMeta::default()).unwrap();
//! assert!(pipeline.authorize(&ctx.user, AuthGate::PublicRead).is_ok());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod gate;
mod pipeline;

pub use context::{PipelineContext, RequestMeta};
pub use gate::AuthGate;
pub use pipeline::Pipeline;
