//! In-memory agent registry mirrored to a durable file (spec §4.F).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use mh_audit::{Actor, AuditLog};
use mh_core::UserId;
use mh_storage::JsonDocument;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::process::Child;

use crate::error::{AgentError, AgentResult};
use crate::pid::is_pid_alive;
use crate::types::{AgentKey, AgentRecord, StopOutcome, TriggerState, TriggerType};

/// `agents/registry.json` document shape.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    agents: Vec<AgentRecord>,
}

/// Bounded wait before escalating a graceful termination to a force-kill
/// (spec §4.F: "waits a bounded interval per agent, then escalates").
const GRACEFUL_WINDOW: std::time::Duration = std::time::Duration::from_secs(5);
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);

/// Tracks every live agent process. Mirrors each change to a durable
/// JSON file so the registry survives a process restart and other
/// processes (the CLI, a health check) can see what's running.
///
/// Only agents this process itself spawned have a live
/// [`tokio::process::Child`] handle in memory; records inherited from a
/// prior run (present in the durable file, absent from the in-memory
/// map) can still be purged or signaled by pid, just without a real
/// exit status.
#[derive(Clone)]
pub struct AgentRegistry {
    doc: Arc<JsonDocument<RegistryFile>>,
    children: Arc<RwLock<HashMap<AgentKey, Child>>>,
    audit: AuditLog,
}

impl AgentRegistry {
    /// Bind to the durable registry file and audit log.
    #[must_use]
    pub fn new(registry_path: impl Into<std::path::PathBuf>, audit: AuditLog) -> Self {
        Self {
            doc: Arc::new(JsonDocument::new(registry_path)),
            children: Arc::new(RwLock::new(HashMap::new())),
            audit,
        }
    }

    /// Register a freshly spawned agent. Rejects a duplicate live
    /// `(user, name)` record (spec §4.F).
    ///
    /// # Errors
    /// Returns [`AgentError::DuplicateAgent`] if a record already exists
    /// for this `(user, name)`, or a storage error if the durable file
    /// can't be written.
    pub async fn register_agent(
        &self,
        user: UserId,
        name: &str,
        pid: u32,
        trigger_type: TriggerType,
        trigger_state: TriggerState,
        child: Option<Child>,
    ) -> AgentResult<AgentRecord> {
        let record = AgentRecord {
            name: name.to_string(),
            pid,
            user,
            started_at: Utc::now(),
            trigger_type,
            trigger_state,
        };

        let name_owned = name.to_string();
        self.doc.try_update(|mut file| {
            if file.agents.iter().any(|r| r.user == user && r.name == name_owned) {
                return Err(mh_storage::StorageError::Lock(format!(
                    "duplicate:{name_owned}"
                )));
            }
            file.agents.push(record.clone());
            Ok(file)
        }).map_err(|e| match e {
            mh_storage::StorageError::Lock(msg) if msg == format!("duplicate:{name}") => {
                AgentError::DuplicateAgent { name: name.to_string() }
            }
            other => AgentError::Storage(other),
        })?;

        if let Some(child) = child {
            self.children.write().await.insert(record.key(), child);
        }

        Ok(record)
    }

    /// Remove a record once its process has exited on its own (not via
    /// [`Self::stop_all_agents`], which removes as it stops).
    ///
    /// # Errors
    /// Returns a storage error if the durable file can't be written.
    pub async fn deregister(&self, key: &AgentKey) -> AgentResult<()> {
        self.children.write().await.remove(key);
        let user = key.user;
        let name = key.name.clone();
        self.doc.update(|mut file| {
            file.agents.retain(|r| !(r.user == user && r.name == name));
            file
        })?;
        Ok(())
    }

    /// Every record currently on file for `user`.
    ///
    /// # Errors
    /// Returns a storage error if the durable file can't be read.
    pub fn list_for_user(&self, user: UserId) -> AgentResult<Vec<AgentRecord>> {
        Ok(self.doc.load()?.agents.into_iter().filter(|r| r.user == user).collect())
    }

    /// Every record on file, for every user.
    ///
    /// # Errors
    /// Returns a storage error if the durable file can't be read.
    pub fn list_all(&self) -> AgentResult<Vec<AgentRecord>> {
        Ok(self.doc.load()?.agents)
    }

    /// Drop any record whose pid is no longer alive (spec §4.F: "purged
    /// on scheduler start and on demand"). Returns the purged records.
    ///
    /// # Errors
    /// Returns a storage error if the durable file can't be written.
    pub async fn purge_stale(&self) -> AgentResult<Vec<AgentRecord>> {
        let live_children: std::collections::HashSet<AgentKey> =
            self.children.read().await.keys().cloned().collect();
        let purged = std::cell::RefCell::new(Vec::new());
        self.doc.update(|mut file| {
            let (alive, dead): (Vec<_>, Vec<_>) = file.agents.into_iter().partition(|r| {
                live_children.contains(&r.key()) || is_pid_alive(r.pid)
            });
            *purged.borrow_mut() = dead;
            file.agents = alive;
            file
        })?;
        Ok(purged.into_inner())
    }

    /// Stop every live agent (or, if `user` is given, just that user's
    /// agents): send a graceful termination signal, wait up to
    /// [`GRACEFUL_WINDOW`], escalate to a force-kill if it is still
    /// alive, then remove the record. Emits one audit record per agent
    /// (spec §4.F).
    ///
    /// `caller` identifies the agent issuing the call, if any — `None`
    /// when the sweep was triggered by a human/browser session rather
    /// than by a running agent calling back in. When `caller` is
    /// `Some(key)` and `include_self` is `false` (the default per spec
    /// §4.F `stopAllAgents(includeSelf?)`), that agent's own record is
    /// excluded from the sweep so it can finish issuing the call.
    ///
    /// # Errors
    /// Returns a storage error if the durable file can't be updated at
    /// the end of the sweep. Individual per-agent signal failures are
    /// recorded in the audit log, not returned.
    pub async fn stop_all_agents(
        &self,
        user: Option<UserId>,
        include_self: bool,
        caller: Option<&AgentKey>,
    ) -> AgentResult<Vec<(AgentRecord, StopOutcome)>> {
        let records: Vec<AgentRecord> = self
            .doc
            .load()?
            .agents
            .into_iter()
            .filter(|r| user.is_none_or(|u| r.user == u))
            .filter(|r| include_self || caller != Some(&r.key()))
            .collect();

        let mut outcomes = Vec::with_capacity(records.len());
        for record in &records {
            let key = record.key();
            let child = self.children.write().await.remove(&key);
            let outcome = stop_one(record.pid, child).await;
            outcomes.push((record.clone(), outcome));

            let _ = self.audit.record_action(
                "agent.stopped",
                Actor {
                    user_id: Some(record.user),
                    role: None,
                },
                serde_json::json!({
                    "agent": record.name,
                    "pid": record.pid,
                    "outcome": outcome,
                }),
            );
        }

        let stopped_keys: std::collections::HashSet<AgentKey> =
            records.iter().map(AgentRecord::key).collect();
        self.doc.update(|mut file| {
            file.agents.retain(|r| !stopped_keys.contains(&r.key()));
            file
        })?;

        Ok(outcomes)
    }
}

async fn stop_one(pid: u32, child: Option<Child>) -> StopOutcome {
    if !is_pid_alive(pid) {
        return StopOutcome::AlreadyGone;
    }

    if let Some(mut child) = child {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        match tokio::time::timeout(GRACEFUL_WINDOW, child.wait()).await {
            Ok(Ok(status)) => return StopOutcome::Exited { code: status.code() },
            Ok(Err(_)) | Err(_) => {
                let _ = child.start_kill();
                let _ = tokio::time::timeout(GRACEFUL_WINDOW, child.wait()).await;
                return StopOutcome::Forced;
            }
        }
    }

    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    let deadline = tokio::time::Instant::now() + GRACEFUL_WINDOW;
    while tokio::time::Instant::now() < deadline {
        if !is_pid_alive(pid) {
            return StopOutcome::Graceful;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    if is_pid_alive(pid) {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
        StopOutcome::Forced
    } else {
        StopOutcome::Graceful
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (tempfile::TempDir, AgentRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let audit = AuditLog::new(dir.path().join("logs/audit"));
        let registry = AgentRegistry::new(dir.path().join("agents/registry.json"), audit);
        (dir, registry)
    }

    #[tokio::test]
    async fn register_then_list_round_trips() {
        let (_dir, registry) = registry();
        let user = UserId::new();
        registry
            .register_agent(user, "reflector", std::process::id(), TriggerType::Interval, serde_json::json!({}), None)
            .await
            .unwrap();

        let records = registry.list_for_user(user).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "reflector");
    }

    #[tokio::test]
    async fn duplicate_registration_rejected() {
        let (_dir, registry) = registry();
        let user = UserId::new();
        registry
            .register_agent(user, "reflector", std::process::id(), TriggerType::Interval, serde_json::json!({}), None)
            .await
            .unwrap();
        let result = registry
            .register_agent(user, "reflector", std::process::id(), TriggerType::Interval, serde_json::json!({}), None)
            .await;
        assert!(matches!(result, Err(AgentError::DuplicateAgent { .. })));
    }

    #[tokio::test]
    async fn different_users_can_share_an_agent_name() {
        let (_dir, registry) = registry();
        let alice = UserId::new();
        let bob = UserId::new();
        registry
            .register_agent(alice, "reflector", std::process::id(), TriggerType::Interval, serde_json::json!({}), None)
            .await
            .unwrap();
        registry
            .register_agent(bob, "reflector", std::process::id(), TriggerType::Interval, serde_json::json!({}), None)
            .await
            .unwrap();
        assert_eq!(registry.list_all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn purge_stale_drops_dead_pids_keeps_live_ones() {
        let (_dir, registry) = registry();
        let user = UserId::new();
        // Our own pid is always alive.
        registry
            .register_agent(user, "live", std::process::id(), TriggerType::Interval, serde_json::json!({}), None)
            .await
            .unwrap();
        // Pid 1 is reserved (init) in any real environment this test
        // runs in, but we want a pid that is certainly *not* alive: use
        // an implausibly high value instead, since real systems never
        // reuse it this quickly.
        registry
            .register_agent(user, "dead", 999_999, TriggerType::Interval, serde_json::json!({}), None)
            .await
            .unwrap();

        let purged = registry.purge_stale().await.unwrap();
        assert_eq!(purged.len(), 1);
        assert_eq!(purged[0].name, "dead");

        let remaining = registry.list_for_user(user).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "live");
    }

    #[tokio::test]
    async fn stop_all_agents_removes_records_and_emits_audit() {
        let (dir, registry) = registry();
        let user = UserId::new();
        registry
            .register_agent(user, "dead", 999_999, TriggerType::Interval, serde_json::json!({}), None)
            .await
            .unwrap();

        let outcomes = registry.stop_all_agents(Some(user), false, None).await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0].1, StopOutcome::AlreadyGone));
        assert!(registry.list_for_user(user).unwrap().is_empty());

        let today = Utc::now().date_naive();
        let entries = AuditLog::new(dir.path().join("logs/audit")).read_day(today).unwrap();
        assert!(entries.iter().any(|e| e.event == "agent.stopped"));
    }

    #[tokio::test]
    async fn stop_all_agents_excludes_caller_unless_include_self() {
        let (_dir, registry) = registry();
        let user = UserId::new();
        registry
            .register_agent(user, "caller", 999_999, TriggerType::Interval, serde_json::json!({}), None)
            .await
            .unwrap();
        registry
            .register_agent(user, "sibling", 999_998, TriggerType::Interval, serde_json::json!({}), None)
            .await
            .unwrap();
        let caller_key = AgentKey::new(user, "caller");

        let outcomes = registry
            .stop_all_agents(Some(user), false, Some(&caller_key))
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].0.name, "sibling");
        assert_eq!(registry.list_for_user(user).unwrap().len(), 1);
        assert_eq!(registry.list_for_user(user).unwrap()[0].name, "caller");

        let outcomes = registry
            .stop_all_agents(Some(user), true, Some(&caller_key))
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].0.name, "caller");
        assert!(registry.list_for_user(user).unwrap().is_empty());
    }
}
