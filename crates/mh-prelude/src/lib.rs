//! Unified prelude for the Metahost multi-tenant agent runtime.
//!
//! A single import to bring in the commonly used types from across the
//! workspace: shared types and errors (`mh-core`), crypto primitives
//! (`mh-crypto`), durable storage (`mh-storage`), identity & sessions
//! (`mh-identity`), the storage router (`mh-router`), the security
//! policy (`mh-policy`), the encryption subsystem (`mh-vault`), the
//! audit log (`mh-audit`), the activity bus (`mh-events`), the agent
//! registry & scheduler (`mh-agents`), the full-cycle orchestrator
//! (`mh-orchestrator`), the request pipeline (`mh-pipeline`), and
//! configuration (`mh-config`).
//!
//! Reach for a crate's own `prelude` module instead when only one area
//! is in scope.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub use mh_agents::prelude::*;
pub use mh_audit::prelude::*;
pub use mh_config::prelude::*;
pub use mh_core::{AppRoot, CognitiveMode, CognitiveModeCell, MhError, MhResult, ModeSnapshot, Role, UserContext};
pub use mh_crypto::prelude::*;
pub use mh_events::prelude::*;
pub use mh_identity::prelude::*;
pub use mh_orchestrator::prelude::*;
pub use mh_pipeline::prelude::*;
pub use mh_policy::prelude::*;
pub use mh_router::prelude::*;
pub use mh_storage::{FileLock, JsonDocument, StorageError, StorageResult};
pub use mh_telemetry::prelude::*;
