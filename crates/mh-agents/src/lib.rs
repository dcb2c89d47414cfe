//! Agent registry and scheduler (spec §4.F, §4.G).
//!
//! [`registry::AgentRegistry`] is the durable `(user, name) -> AgentRecord`
//! map every running agent is mirrored to; [`scheduler::Scheduler`] reads
//! each user's `etc/agents.json`, decides when interval/time-of-day/
//! activity triggers fire, and spawns the agent's entry point as a child
//! process under the registry's supervision.
//!
//! # Example
//!
//! ```no_run
//! use mh_agents::{AgentRegistry, Scheduler, ProfileUser};
//! use mh_audit::AuditLog;
//! use mh_events::ActivityBus;
//!
//! # async fn example() {
//! let registry = AgentRegistry::new("/var/metahost/agents/registry.json", AuditLog::new("/var/metahost/logs/audit"));
//! let scheduler = Scheduler::new(registry, ActivityBus::new(), AuditLog::new("/var/metahost/logs/audit"));
//! scheduler.purge_stale_on_start().await.unwrap();
//!
//! let users = vec![ProfileUser {
//!     user_id: mh_core::UserId::new(),
//!     username: "alice".to_string(),
//!     profile_root: "/var/metahost/profiles/alice".into(),
//! }];
//! let _outcomes = scheduler.tick(chrono::Utc::now(), &users).await;
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod prelude;
pub mod registry;
pub mod scheduler;
pub mod spawn;
pub mod types;
pub mod watcher;

mod pid;

pub use config::{AgentConfigEntry, AgentsConfig, EntryPoint};
pub use error::{AgentError, AgentResult};
pub use registry::AgentRegistry;
pub use scheduler::{ProfileUser, Scheduler, TickOutcome};
pub use types::{AgentKey, AgentRecord, StopOutcome, TriggerState, TriggerType};
pub use watcher::ConfigWatcher;
