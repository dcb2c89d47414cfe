//! Per-user agent scheduling (spec §4.G).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use mh_audit::{Actor, AuditLog};
use mh_core::UserId;
use mh_events::ActivityBus;
use tokio::sync::RwLock;

use crate::config::{AgentConfigEntry, AgentsConfig, EntryPoint};
use crate::error::AgentResult;
use crate::registry::AgentRegistry;
use crate::spawn::{self, DEFAULT_STARTUP_WINDOW};
use crate::types::{AgentKey, AgentRecord, TriggerType};

/// A freshly-constructed, single-user context for one scheduler pass
/// (spec §4.G: "each invocation runs under a freshly-constructed user
/// context so no profile root leaks across users"). Supplied by the
/// caller (typically `mh-server`, iterating its identity store) rather
/// than resolved internally, so this crate stays independent of
/// `mh-identity`.
#[derive(Debug, Clone)]
pub struct ProfileUser {
    /// The user this pass runs as.
    pub user_id: UserId,
    /// Username, used for child-process environment and logging.
    pub username: String,
    /// Resolved profile root (from `mh-router`).
    pub profile_root: PathBuf,
}

impl ProfileUser {
    fn config_path(&self) -> PathBuf {
        self.profile_root.join("etc").join("agents.json")
    }
}

/// What happened to one configured agent during a tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// The agent fired and was registered.
    Fired(AgentRecord),
    /// The agent's trigger did not fire this tick.
    Skipped,
    /// The agent fired but failed to spawn or become ready.
    Failed {
        /// The agent's name.
        name: String,
        /// Why the launch failed.
        reason: String,
    },
}

#[derive(Debug, Clone, Default)]
struct RuntimeState {
    /// Next scheduled fire time, for interval/time-of-day triggers.
    next_fire: Option<DateTime<Utc>>,
    /// The `last_activity` value this agent last fired against, for the
    /// activity trigger (spec §4.G: fires once per inactivity episode,
    /// not on every tick past the threshold).
    last_fired_activity_at: Option<DateTime<Utc>>,
}

/// Iterates users sequentially, evaluates each enabled agent's trigger,
/// and spawns the ones that fire. Re-reads each user's `etc/agents.json`
/// on every tick, so an edit takes effect on the very next tick with no
/// separate reload step (spec §4.G "hot-reload").
pub struct Scheduler {
    registry: AgentRegistry,
    activity: ActivityBus,
    audit: AuditLog,
    process_started_at: DateTime<Utc>,
    state: RwLock<HashMap<AgentKey, RuntimeState>>,
    startup_window: Duration,
}

impl Scheduler {
    /// Construct a scheduler bound to a registry, activity bus, and
    /// audit log. `process_started_at` anchors interval triggers'
    /// `runOnBoot` calculation.
    #[must_use]
    pub fn new(registry: AgentRegistry, activity: ActivityBus, audit: AuditLog) -> Self {
        Self {
            registry,
            activity,
            audit,
            process_started_at: Utc::now(),
            state: RwLock::new(HashMap::new()),
            startup_window: DEFAULT_STARTUP_WINDOW,
        }
    }

    /// Override the bounded agent start-up window (default
    /// [`DEFAULT_STARTUP_WINDOW`]); mainly for tests.
    #[must_use]
    pub fn with_startup_window(mut self, window: Duration) -> Self {
        self.startup_window = window;
        self
    }

    /// Evaluate every enabled agent for every user and spawn the ones
    /// whose trigger fires. An agent already running for a user (live in
    /// the registry) is left alone rather than re-fired (spec §4.G: a
    /// removed or still-running agent "is drained (not killed)").
    pub async fn tick(&self, now: DateTime<Utc>, users: &[ProfileUser]) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        for user in users {
            let config = match AgentsConfig::load(&user.config_path()) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(user = %user.username, error = %e, "failed to read agent configuration");
                    continue;
                }
            };

            let running: std::collections::HashSet<String> = self
                .registry
                .list_for_user(user.user_id)
                .unwrap_or_default()
                .into_iter()
                .map(|r| r.name)
                .collect();

            for (name, entry) in config.enabled_agents() {
                if running.contains(name) {
                    outcomes.push(TickOutcome::Skipped);
                    continue;
                }
                let key = AgentKey::new(user.user_id, name);
                let should_fire = self.evaluate(&key, entry, now, user.user_id).await;
                if !should_fire {
                    outcomes.push(TickOutcome::Skipped);
                    continue;
                }
                outcomes.push(self.fire(user, name, entry).await);
            }
        }
        outcomes
    }

    async fn evaluate(&self, key: &AgentKey, entry: &AgentConfigEntry, now: DateTime<Utc>, user: UserId) -> bool {
        let mut guard = self.state.write().await;
        let state = guard.entry(key.clone()).or_default();

        match entry.trigger_type {
            TriggerType::Interval => self.evaluate_interval(state, entry, now, entry.run_on_boot),
            TriggerType::TimeOfDay => self.evaluate_time_of_day(state, entry, now),
            TriggerType::Activity => self.evaluate_activity(state, entry, now, user).await,
            TriggerType::Event => false,
        }
    }

    fn evaluate_interval(&self, state: &mut RuntimeState, entry: &AgentConfigEntry, now: DateTime<Utc>, run_on_boot: bool) -> bool {
        let Some(interval) = entry.interval else { return false };
        let interval = chrono::Duration::seconds(interval as i64);

        if state.next_fire.is_none() {
            state.next_fire = Some(if run_on_boot {
                self.process_started_at
            } else {
                self.process_started_at + interval
            });
        }

        let Some(next_fire) = state.next_fire else { return false };
        if now >= next_fire {
            // Coalesce any missed windows: resume the cadence from now
            // rather than replaying every boundary that elapsed while
            // the process was down or busy (spec §4.G: "missed ticks are
            // coalesced (at most one pending run)").
            state.next_fire = Some(now + interval);
            true
        } else {
            false
        }
    }

    fn evaluate_time_of_day(&self, state: &mut RuntimeState, entry: &AgentConfigEntry, now: DateTime<Utc>) -> bool {
        let Some(schedule) = entry.schedule.as_deref() else { return false };
        let Ok(target) = NaiveTime::parse_from_str(schedule, "%H:%M") else {
            tracing::warn!(schedule, "invalid HH:MM schedule, skipping");
            return false;
        };

        if state.next_fire.is_none() {
            state.next_fire = Some(next_occurrence(target, now));
        }

        let Some(next_fire) = state.next_fire else { return false };
        if now >= next_fire {
            // No catch-up (spec §4.G): the next occurrence is always
            // tomorrow's, even if today's was missed entirely.
            state.next_fire = Some(next_occurrence(target, now + chrono::Duration::seconds(1)));
            true
        } else {
            false
        }
    }

    async fn evaluate_activity(&self, state: &mut RuntimeState, entry: &AgentConfigEntry, now: DateTime<Utc>, user: UserId) -> bool {
        let Some(threshold) = entry.inactivity_threshold else { return false };
        let Some(last_activity) = self.activity.last_activity(user).await else {
            return false;
        };
        if state.last_fired_activity_at == Some(last_activity) {
            return false;
        }
        let elapsed = now - last_activity;
        if elapsed >= chrono::Duration::seconds(threshold as i64) {
            state.last_fired_activity_at = Some(last_activity);
            true
        } else {
            false
        }
    }

    async fn fire(&self, user: &ProfileUser, name: &str, entry: &AgentConfigEntry) -> TickOutcome {
        let entry_point = match entry.entry_point(name) {
            Ok(ep) => ep,
            Err(e) => {
                return TickOutcome::Failed {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        let child = match spawn::spawn_entry_point(&entry_point, user) {
            Ok(child) => child,
            Err(e) => {
                let _ = self.audit.record_security(
                    mh_audit::Level::Warn,
                    "agent.spawn_failed",
                    Actor {
                        user_id: Some(user.user_id),
                        role: None,
                    },
                    serde_json::json!({"agent": name, "error": e.to_string()}),
                );
                return TickOutcome::Failed {
                    name: name.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        let Some(pid) = child.id() else {
            return TickOutcome::Failed {
                name: name.to_string(),
                reason: "child process exited before a pid could be read".to_string(),
            };
        };

        if !spawn::wait_for_readiness(pid, self.startup_window).await {
            let _ = self.audit.record_security(
                mh_audit::Level::Warn,
                "agent.launch_failed",
                Actor {
                    user_id: Some(user.user_id),
                    role: None,
                },
                serde_json::json!({"agent": name, "pid": pid}),
            );
            return TickOutcome::Failed {
                name: name.to_string(),
                reason: "agent did not report readiness within the start-up window".to_string(),
            };
        }

        let entry_label = match &entry_point {
            EntryPoint::Path(path) => serde_json::json!({"agentPath": path}),
            EntryPoint::Task(task) => serde_json::json!({"task": task}),
        };

        match self
            .registry
            .register_agent(user.user_id, name, pid, entry.trigger_type, entry_label, Some(child))
            .await
        {
            Ok(record) => {
                let _ = self.audit.record_action(
                    "agent.started",
                    Actor {
                        user_id: Some(user.user_id),
                        role: None,
                    },
                    serde_json::json!({"agent": name, "pid": pid}),
                );
                TickOutcome::Fired(record)
            }
            Err(e) => TickOutcome::Failed {
                name: name.to_string(),
                reason: e.to_string(),
            },
        }
    }

    /// Purge stale registry records (spec §4.F: "on every scheduler
    /// start"). Call once before the first [`Self::tick`].
    ///
    /// # Errors
    /// Returns a storage error if the durable registry file can't be
    /// written.
    pub async fn purge_stale_on_start(&self) -> AgentResult<()> {
        self.registry.purge_stale().await?;
        Ok(())
    }
}

fn resolve_local(naive: chrono::NaiveDateTime, fallback: DateTime<Local>) -> DateTime<Local> {
    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(dt, _) => dt,
        chrono::LocalResult::None => fallback,
    }
}

fn next_occurrence(target: NaiveTime, after: DateTime<Utc>) -> DateTime<Utc> {
    let local_now = after.with_timezone(&Local);
    let today_naive = local_now.date_naive().and_time(target);
    let mut candidate = resolve_local(today_naive, local_now + chrono::Duration::minutes(1));
    if candidate <= local_now {
        let tomorrow_naive = today_naive + chrono::Duration::days(1);
        candidate = resolve_local(tomorrow_naive, local_now + chrono::Duration::days(1));
    }
    candidate.with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfigEntry;

    fn registry_and_audit() -> (tempfile::TempDir, AgentRegistry, AuditLog) {
        let dir = tempfile::tempdir().unwrap();
        let audit = AuditLog::new(dir.path().join("logs/audit"));
        let registry = AgentRegistry::new(dir.path().join("agents/registry.json"), audit.clone());
        (dir, registry, audit)
    }

    fn write_config(user: &ProfileUser, entries: HashMap<String, AgentConfigEntry>) {
        std::fs::create_dir_all(user.profile_root.join("etc")).unwrap();
        let config = AgentsConfig { agents: entries };
        mh_storage::write_json(&user.config_path(), &config).unwrap();
    }

    fn interval_entry(path: &str, interval: u64, run_on_boot: bool) -> AgentConfigEntry {
        AgentConfigEntry {
            enabled: true,
            trigger_type: TriggerType::Interval,
            interval: Some(interval),
            schedule: None,
            inactivity_threshold: None,
            agent_path: Some(path.to_string()),
            task: None,
            run_on_boot,
        }
    }

    #[tokio::test]
    async fn interval_agent_fires_on_boot_when_configured() {
        let (dir, registry, audit) = registry_and_audit();
        let user = ProfileUser {
            user_id: UserId::new(),
            username: "alice".to_string(),
            profile_root: dir.path().join("profiles/alice"),
        };
        let mut agents = HashMap::new();
        agents.insert("reflector".to_string(), interval_entry("/bin/sleep", 3600, true));
        write_config(&user, agents);

        let scheduler = Scheduler::new(registry, ActivityBus::new(), audit)
            .with_startup_window(Duration::from_millis(200));
        let outcomes = scheduler.tick(Utc::now(), std::slice::from_ref(&user)).await;
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, TickOutcome::Fired(r) if r.name == "reflector")));
    }

    #[tokio::test]
    async fn interval_agent_without_run_on_boot_waits_a_full_interval() {
        let (dir, registry, audit) = registry_and_audit();
        let user = ProfileUser {
            user_id: UserId::new(),
            username: "alice".to_string(),
            profile_root: dir.path().join("profiles/alice"),
        };
        let mut agents = HashMap::new();
        agents.insert("reflector".to_string(), interval_entry("/bin/sleep", 3600, false));
        write_config(&user, agents);

        let scheduler = Scheduler::new(registry, ActivityBus::new(), audit)
            .with_startup_window(Duration::from_millis(200));
        let outcomes = scheduler.tick(Utc::now(), std::slice::from_ref(&user)).await;
        assert!(outcomes.iter().all(|o| matches!(o, TickOutcome::Skipped)));
    }

    #[tokio::test]
    async fn activity_trigger_fires_once_per_inactivity_episode() {
        let (dir, registry, audit) = registry_and_audit();
        let user = ProfileUser {
            user_id: UserId::new(),
            username: "alice".to_string(),
            profile_root: dir.path().join("profiles/alice"),
        };
        let mut agents = HashMap::new();
        agents.insert(
            "organizer".to_string(),
            AgentConfigEntry {
                enabled: true,
                trigger_type: TriggerType::Activity,
                interval: None,
                schedule: None,
                inactivity_threshold: Some(1),
                agent_path: Some("/bin/sleep".to_string()),
                task: None,
                run_on_boot: false,
            },
        );
        write_config(&user, agents);

        let bus = ActivityBus::new();
        bus.record_write(user.user_id).await;

        let scheduler = Scheduler::new(registry, bus, audit).with_startup_window(Duration::from_millis(200));

        // Not yet past the threshold.
        let outcomes = scheduler.tick(Utc::now(), std::slice::from_ref(&user)).await;
        assert!(outcomes.iter().all(|o| matches!(o, TickOutcome::Skipped)));

        // Past the threshold: fires once.
        let later = Utc::now() + chrono::Duration::seconds(2);
        let outcomes = scheduler.tick(later, std::slice::from_ref(&user)).await;
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, TickOutcome::Fired(r) if r.name == "organizer")));
    }

    #[test]
    fn next_occurrence_picks_today_or_tomorrow() {
        let now = Utc::now();
        let future_time = (now + chrono::Duration::hours(1)).with_timezone(&Local).time();
        let next = next_occurrence(future_time, now);
        assert!(next > now);
        assert!(next - now <= chrono::Duration::hours(1) + chrono::Duration::minutes(1));
    }
}
