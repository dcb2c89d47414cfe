//! `/api/agents/control` (spec §6, §4.F, §4.G).

use axum::extract::{Extension, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use mh_agents::ProfileUser;
use mh_core::MhError;
use mh_pipeline::{AuthGate, PipelineContext};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/agents/control", post(control))
}

#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
enum ControlRequest {
    StopAll {
        /// Spec §4.F `stopAllAgents(includeSelf?)`. This route is only
        /// ever called from a human/browser session, never from a
        /// running agent calling back into its own API, so there is no
        /// caller agent to exclude by default — the flag is accepted
        /// for wire-format fidelity with the spec'd signature but has
        /// no effect here (every matching record is always stopped).
        #[serde(default)]
        include_self: bool,
    },
    RestartCore,
}

#[derive(Serialize)]
struct ControlResponse {
    stopped: usize,
}

async fn control(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
    Json(body): Json<ControlRequest>,
) -> Result<Json<ControlResponse>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::Authenticated)?;
    let user_id = ctx
        .user
        .user_id
        .ok_or_else(|| MhError::unauthenticated("no session"))?;
    let username = ctx
        .user
        .username
        .clone()
        .ok_or_else(|| MhError::unauthenticated("no session"))?;
    let profile_root = ctx
        .user
        .profile_root
        .clone()
        .ok_or_else(|| MhError::internal("authenticated context missing a profile root"))?;

    let include_self = matches!(body, ControlRequest::StopAll { include_self: true });
    let stopped = state
        .agents
        .stop_all_agents(Some(user_id), include_self, None)
        .await?;

    let action = match body {
        ControlRequest::StopAll { .. } => "agents.control.stop_all",
        ControlRequest::RestartCore => {
            // Force an immediate tick so any agent whose trigger is
            // already due respawns right away, rather than waiting for
            // the scheduler's next regular pass.
            let profile_user = ProfileUser {
                user_id,
                username,
                profile_root,
            };
            state.scheduler.tick(Utc::now(), &[profile_user]).await;
            "agents.control.restart_core"
        }
    };

    state.pipeline.record_action(&ctx.user, action, serde_json::json!({}))?;

    Ok(Json(ControlResponse {
        stopped: stopped.len(),
    }))
}
