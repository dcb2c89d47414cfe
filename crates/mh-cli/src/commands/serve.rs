//! `mh serve` (spec §4.I, §6): boot every domain crate and run the HTTP
//! surface in this process — there is no separate always-on daemon to
//! connect to.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mh_agents::{AgentRegistry, ProfileUser, Scheduler};
use mh_audit::AuditLog;
use mh_core::CognitiveModeCell;
use mh_events::ActivityBus;
use mh_identity::IdentityStore;
use mh_orchestrator::{FullCycleOrchestrator, HttpModelServerClient};
use mh_pipeline::Pipeline;
use mh_server::AppState;
use mh_vault::KeyCache;
use tokio::net::TcpListener;

use crate::error::CliError;

/// How often the background scheduler re-reads every user's `agents.json`
/// and evaluates triggers (spec §4.G).
const TICK_INTERVAL: Duration = Duration::from_secs(30);

pub async fn run() -> Result<(), CliError> {
    let app_root = super::open_app_root()?;
    let config = mh_config::load(app_root.system_config_file())?;

    let _log_guard = mh_telemetry::init(&app_root.system_logs_dir(), "info")
        .map_err(|e| mh_core::MhError::internal(e.to_string()))?;

    let mode = Arc::new(CognitiveModeCell::new(config.startup.high_security));
    let identity = IdentityStore::new(&app_root);
    let audit = AuditLog::new(app_root.system_logs_dir().join("audit"));
    let pipeline = Pipeline::new(identity.clone(), app_root.clone(), mode.clone(), audit.clone());
    let key_cache = KeyCache::new();

    let agents = AgentRegistry::new(app_root.agent_registry_path(), audit.clone());
    let activity = ActivityBus::new();
    let scheduler = Arc::new(Scheduler::new(agents.clone(), activity.clone(), audit.clone()));
    scheduler
        .purge_stale_on_start()
        .await
        .map_err(|e| mh_core::MhError::internal(e.to_string()))?;

    let model_server = Arc::new(HttpModelServerClient::from_env());
    let orchestrator = Arc::new(FullCycleOrchestrator::new(model_server, audit.clone()));

    let config = Arc::new(config);
    let state = AppState {
        pipeline,
        identity: identity.clone(),
        app_root: app_root.clone(),
        mode,
        audit,
        key_cache,
        agents,
        scheduler: scheduler.clone(),
        activity,
        orchestrator,
        config: config.clone(),
    };

    tokio::spawn(tick_loop(app_root.clone(), identity, scheduler));

    let router = mh_server::build_router(state);
    let listener = TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "mh-server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Rebuild the active-user list from the identity store on every tick —
/// simpler than wiring `mh_agents::ConfigWatcher` in, since `Scheduler::tick`
/// already re-reads each user's `agents.json` from scratch regardless.
async fn tick_loop(app_root: mh_core::AppRoot, identity: IdentityStore, scheduler: Arc<Scheduler>) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    loop {
        interval.tick().await;
        let users = match identity.list_users() {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(error = %e, "could not list users for scheduler tick");
                continue;
            }
        };
        let profile_users: Vec<ProfileUser> = users
            .into_iter()
            .map(|u| {
                let (profile_root, _) = mh_router::resolve_profile_root(
                    &app_root,
                    &u.username,
                    u.metadata.profile_path.as_deref().map(std::path::Path::new),
                );
                ProfileUser {
                    user_id: u.id,
                    username: u.username,
                    profile_root,
                }
            })
            .collect();
        scheduler.tick(Utc::now(), &profile_users).await;
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
