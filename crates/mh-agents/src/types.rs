//! Durable and in-memory shapes for a running agent (spec §3 "Agent
//! Record", §4.F).

use chrono::{DateTime, Utc};
use mh_core::UserId;
use serde::{Deserialize, Serialize};

/// Which trigger kind fired (or will fire) an agent (spec §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerType {
    /// Fires every `interval` seconds.
    Interval,
    /// Fires at a fixed `HH:MM` in the user's local zone.
    TimeOfDay,
    /// Fires once the user has been inactive for `inactivityThreshold`.
    Activity,
    /// Reserved for future explicit triggers (spec §4.G: "placeholder").
    Event,
}

/// Free-form per-trigger bookkeeping, durable across restarts. Shaped
/// as JSON rather than a fixed struct because each trigger type tracks
/// different things and the registry file must round-trip whatever the
/// scheduler last wrote without the registry crate needing to know the
/// scheduler's internals.
pub type TriggerState = serde_json::Value;

/// `(user, name)` is the registry's primary key (spec §3: "at most one
/// live record per `(user, name)`").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentKey {
    /// Owning user.
    pub user: UserId,
    /// Agent name, unique within the user's configuration.
    pub name: String,
}

impl AgentKey {
    /// Construct a key.
    #[must_use]
    pub fn new(user: UserId, name: impl Into<String>) -> Self {
        Self {
            user,
            name: name.into(),
        }
    }
}

/// One running (or just-exited) agent (spec §3 "Agent Record").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Agent name, unique per user.
    pub name: String,
    /// OS process id of the spawned agent.
    pub pid: u32,
    /// Owning user.
    pub user: UserId,
    /// When the agent was spawned.
    pub started_at: DateTime<Utc>,
    /// Which trigger caused this run.
    pub trigger_type: TriggerType,
    /// Trigger-specific bookkeeping (e.g. last fire time).
    #[serde(default)]
    pub trigger_state: TriggerState,
}

impl AgentRecord {
    /// The `(user, name)` key identifying this record.
    #[must_use]
    pub fn key(&self) -> AgentKey {
        AgentKey::new(self.user, self.name.clone())
    }
}

/// How an agent termination request resolved. Agents recorded across a
/// process restart are not necessarily children of the current process
/// (the durable registry may have been inherited from a prior run), so
/// a POSIX exit status isn't always available: only agents this process
/// itself spawned and is still holding a [`tokio::process::Child`] for
/// yield one, via [`Self::Exited`]. Everything else resolves to
/// [`Self::Graceful`] or [`Self::Forced`] based on signal-and-poll alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StopOutcome {
    /// The process's own exit status, observed via `wait()`.
    Exited {
        /// Raw exit code, if the process exited normally.
        code: Option<i32>,
    },
    /// The process stopped after the graceful signal, no exit status
    /// available (not our child).
    Graceful,
    /// The graceful signal did not stop the process within the bounded
    /// window; it was force-killed.
    Forced,
    /// The process was already gone before any signal was sent.
    AlreadyGone,
}
