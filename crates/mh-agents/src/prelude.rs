//! Commonly used types for convenient import.
//!
//! Use `use mh_agents::prelude::*;` to import all essential types.

pub use crate::config::{AgentConfigEntry, AgentsConfig, EntryPoint};
pub use crate::error::{AgentError, AgentResult};
pub use crate::registry::AgentRegistry;
pub use crate::scheduler::{ProfileUser, Scheduler, TickOutcome};
pub use crate::types::{AgentKey, AgentRecord, StopOutcome, TriggerState, TriggerType};
pub use crate::watcher::ConfigWatcher;
