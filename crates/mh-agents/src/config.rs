//! Per-user agent configuration (`etc/agents.json`, spec §4.G).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, AgentResult};
use crate::types::TriggerType;

/// What the scheduler actually runs when a trigger fires (spec §4.G:
/// "`agentPath` ... **or** `task`").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    /// A script or binary entry point, run as a child process.
    Path(String),
    /// An inline operator goal, handed to the configured operator agent.
    Task(String),
}

/// One agent's schedule and entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfigEntry {
    /// Whether the scheduler considers this agent at all.
    pub enabled: bool,
    /// Which trigger rule applies.
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    /// Seconds between fires, for [`TriggerType::Interval`].
    #[serde(default)]
    pub interval: Option<u64>,
    /// `"HH:MM"` local time, for [`TriggerType::TimeOfDay`].
    #[serde(default)]
    pub schedule: Option<String>,
    /// Seconds of inactivity required to fire, for [`TriggerType::Activity`].
    #[serde(default)]
    pub inactivity_threshold: Option<u64>,
    /// Script/binary entry point.
    #[serde(default)]
    pub agent_path: Option<String>,
    /// Inline operator goal, mutually exclusive with `agent_path`.
    #[serde(default)]
    pub task: Option<String>,
    /// Fire immediately at scheduler start instead of waiting one full
    /// interval (spec §4.G: "first fire at `startedAt + (runOnBoot ? 0 :
    /// interval)`").
    #[serde(default)]
    pub run_on_boot: bool,
}

impl AgentConfigEntry {
    /// Validate and extract the entry point (spec §4.G: exactly one of
    /// `agentPath`/`task`).
    ///
    /// # Errors
    /// Returns [`AgentError::InvalidConfig`] if neither or both are set,
    /// or if a required trigger field is missing for `trigger_type`.
    pub fn entry_point(&self, name: &str) -> AgentResult<EntryPoint> {
        match (&self.agent_path, &self.task) {
            (Some(path), None) => Ok(EntryPoint::Path(path.clone())),
            (None, Some(task)) => Ok(EntryPoint::Task(task.clone())),
            (Some(_), Some(_)) => Err(AgentError::InvalidConfig {
                name: name.to_string(),
                reason: "agentPath and task are mutually exclusive".to_string(),
            }),
            (None, None) => Err(AgentError::InvalidConfig {
                name: name.to_string(),
                reason: "one of agentPath or task is required".to_string(),
            }),
        }
    }

    /// Validate the fields a given trigger type requires are present.
    ///
    /// # Errors
    /// Returns [`AgentError::InvalidConfig`] if a required field is missing.
    pub fn validate(&self, name: &str) -> AgentResult<()> {
        self.entry_point(name)?;
        match self.trigger_type {
            TriggerType::Interval if self.interval.is_none() => Err(AgentError::InvalidConfig {
                name: name.to_string(),
                reason: "interval trigger requires `interval`".to_string(),
            }),
            TriggerType::TimeOfDay if self.schedule.is_none() => Err(AgentError::InvalidConfig {
                name: name.to_string(),
                reason: "time-of-day trigger requires `schedule`".to_string(),
            }),
            TriggerType::Activity if self.inactivity_threshold.is_none() => {
                Err(AgentError::InvalidConfig {
                    name: name.to_string(),
                    reason: "activity trigger requires `inactivityThreshold`".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// `etc/agents.json` document shape: agent name → configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Agents keyed by name.
    #[serde(default)]
    pub agents: HashMap<String, AgentConfigEntry>,
}

impl AgentsConfig {
    /// Read a user's agent configuration fresh off disk. A missing file
    /// is an empty configuration, not an error: `mh-storage::read_json`
    /// already treats "file absent" as `None`, and every field here has
    /// a default.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> AgentResult<Self> {
        Ok(mh_storage::read_json::<Self>(path)?.unwrap_or_default())
    }

    /// Every enabled, valid entry. Entries that fail validation are
    /// dropped with a warning rather than failing the whole load — one
    /// malformed agent shouldn't block every other agent for the user.
    #[must_use]
    pub fn enabled_agents(&self) -> Vec<(&str, &AgentConfigEntry)> {
        self.agents
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .filter_map(|(name, entry)| match entry.validate(name) {
                Ok(()) => Some((name.as_str(), entry)),
                Err(e) => {
                    tracing::warn!(agent = name, error = %e, "dropping invalid agent config entry");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = AgentsConfig::load(&dir.path().join("agents.json")).unwrap();
        assert!(config.agents.is_empty());
    }

    #[test]
    fn entry_point_rejects_both_and_neither() {
        let mut entry = AgentConfigEntry {
            enabled: true,
            trigger_type: TriggerType::Interval,
            interval: Some(60),
            schedule: None,
            inactivity_threshold: None,
            agent_path: None,
            task: None,
            run_on_boot: false,
        };
        assert!(entry.entry_point("reflector").is_err());

        entry.agent_path = Some("bin/reflector".to_string());
        entry.task = Some("reflect".to_string());
        assert!(entry.entry_point("reflector").is_err());

        entry.task = None;
        assert_eq!(
            entry.entry_point("reflector").unwrap(),
            EntryPoint::Path("bin/reflector".to_string())
        );
    }

    #[test]
    fn validate_requires_trigger_specific_fields() {
        let entry = AgentConfigEntry {
            enabled: true,
            trigger_type: TriggerType::TimeOfDay,
            interval: None,
            schedule: None,
            inactivity_threshold: None,
            agent_path: Some("bin/dreamer".to_string()),
            task: None,
            run_on_boot: false,
        };
        assert!(entry.validate("dreamer").is_err());
    }

    #[test]
    fn enabled_agents_drops_invalid_entries_without_failing() {
        let mut agents = HashMap::new();
        agents.insert(
            "good".to_string(),
            AgentConfigEntry {
                enabled: true,
                trigger_type: TriggerType::Interval,
                interval: Some(30),
                schedule: None,
                inactivity_threshold: None,
                agent_path: Some("bin/good".to_string()),
                task: None,
                run_on_boot: false,
            },
        );
        agents.insert(
            "bad".to_string(),
            AgentConfigEntry {
                enabled: true,
                trigger_type: TriggerType::Interval,
                interval: None,
                schedule: None,
                inactivity_threshold: None,
                agent_path: Some("bin/bad".to_string()),
                task: None,
                run_on_boot: false,
            },
        );
        agents.insert(
            "disabled".to_string(),
            AgentConfigEntry {
                enabled: false,
                trigger_type: TriggerType::Interval,
                interval: Some(30),
                schedule: None,
                inactivity_threshold: None,
                agent_path: Some("bin/disabled".to_string()),
                task: None,
                run_on_boot: false,
            },
        );
        let config = AgentsConfig { agents };
        let enabled = config.enabled_agents();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].0, "good");
    }
}
