//! Full-cycle adapter training pipeline (spec §4.H).
//!
//! [`cycle::FullCycleOrchestrator`] runs the fixed build → approve →
//! train → evaluate → activate pipeline for one dataset date at a time,
//! at most once per user concurrently. [`dataset::DatasetRecord`] is a
//! read-only view computed from the files present under a dataset's
//! directory rather than a persisted manifest; [`cancel::cancel_step`]
//! implements the cancellation algorithm a cycle's caller runs against
//! whatever step is currently in flight.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use mh_audit::AuditLog;
//! use mh_orchestrator::{CycleUser, FullCycleOrchestrator, HttpModelServerClient, RunOptions};
//!
//! # async fn example() {
//! let orchestrator = FullCycleOrchestrator::new(
//!     Arc::new(HttpModelServerClient::from_env()),
//!     AuditLog::new("/var/metahost/logs/audit"),
//! );
//! let user = CycleUser {
//!     user_id: mh_core::UserId::new(),
//!     username: "alice".to_string(),
//!     profile_root: "/var/metahost/profiles/alice".into(),
//! };
//! let options = RunOptions {
//!     auto_approve: true,
//!     dry_run: false,
//!     base_model: "llama3:8b".to_string(),
//!     dual_adapter: false,
//!     actor: user.user_id,
//! };
//! let date = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
//! let _outcome = orchestrator.run(&user, date, &options).await.unwrap();
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod cancel;
pub mod cycle;
pub mod dataset;
pub mod error;
pub mod model_server;
pub mod modelfile;
pub mod prelude;
pub mod types;

mod pidfile;

pub use cancel::CancelOutcome;
pub use cycle::{FullCycleOrchestrator, RunOptions};
pub use error::{OrchestratorError, OrchestratorResult};
pub use model_server::{HttpModelServerClient, ModelServerClient, NullModelServerClient};
pub use types::{
    ActiveAdapterRecord, ActiveAdapterStatus, AdapterArtifact, AdapterPair, ApprovalRecord,
    CycleOutcome, CycleUser, DatasetRecord, EvalResult, RejectedRecord,
};
