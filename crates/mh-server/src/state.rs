//! Shared application state passed to every handler (spec §4.D, §4.I).
//!
//! Grounded on `sblanchard-SerialAgent`'s gateway `state.rs`: fields are
//! grouped by concern rather than alphabetically, and everything is
//! either already cheaply `Clone` or wrapped in an `Arc` so `AppState`
//! itself stays `Clone` for axum's `State` extractor.

use std::sync::Arc;

use mh_agents::{AgentRegistry, Scheduler};
use mh_audit::AuditLog;
use mh_config::SystemConfig;
use mh_core::{AppRoot, CognitiveModeCell};
use mh_events::ActivityBus;
use mh_identity::IdentityStore;
use mh_orchestrator::FullCycleOrchestrator;
use mh_pipeline::Pipeline;
use mh_vault::KeyCache;

/// Shared application state for every `mh-server` handler.
#[derive(Clone)]
pub struct AppState {
    // ── Identity & request pipeline ────────────────────────────────
    /// Request-pipeline orchestration: session resolution, auth-gate
    /// checks, audit emission (spec §4.D).
    pub pipeline: Pipeline,
    /// User/session/recovery-code storage (spec §4.A), used directly by
    /// the auth routes for operations `Pipeline` doesn't expose.
    pub identity: IdentityStore,
    /// The installation root every profile and system path hangs off.
    pub app_root: AppRoot,
    /// The process-wide cognitive mode (spec §3, §9).
    pub mode: Arc<CognitiveModeCell>,
    /// Durable, hash-chained audit log (spec §4.D step 5).
    pub audit: AuditLog,

    // ── Encryption ──────────────────────────────────────────────────
    /// Per-process, per-user unlocked-key cache (spec §4.E).
    pub key_cache: KeyCache,

    // ── Agents ──────────────────────────────────────────────────────
    /// Durable `(user, name) -> AgentRecord` map (spec §4.F).
    pub agents: AgentRegistry,
    /// Interval/time-of-day/activity trigger evaluation loop (spec §4.G).
    pub scheduler: Arc<Scheduler>,
    /// Last-write-activity clock the scheduler's `activity` trigger reads.
    pub activity: ActivityBus,

    // ── Full-cycle training ─────────────────────────────────────────
    /// Build → approve → train → evaluate → activate pipeline (spec §4.H).
    pub orchestrator: Arc<FullCycleOrchestrator>,

    // ── Configuration ───────────────────────────────────────────────
    /// System configuration loaded once at boot (spec §10.C).
    pub config: Arc<SystemConfig>,
}
