//! `/api/adapters` (spec §6, §4.H): dataset listing and full-cycle
//! dispatch.
//!
//! No crate exposes "list every dataset for a user" — `mh-orchestrator`
//! only knows how to load one date at a time. This handler scans
//! `out/adapters/` itself, the directory layout spec.md pins down
//! (`out/adapters/<date>/`, with `_rejected` and `history-merged` as the
//! only non-date sibling entries).

use axum::extract::{Extension, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use mh_core::MhError;
use mh_orchestrator::{CycleOutcome, CycleUser, DatasetRecord, RunOptions};
use mh_pipeline::{AuthGate, PipelineContext};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/adapters", get(list).post(dispatch))
}

#[derive(Serialize)]
struct DatasetSummary {
    date: String,
    has_instructions: bool,
    approved: bool,
    evaluated: bool,
    eval_passed: Option<bool>,
    has_artifact: bool,
    has_modelfile: bool,
    rejected: bool,
}

impl DatasetSummary {
    fn from_record(record: &DatasetRecord, rejected: bool) -> Self {
        Self {
            date: record.date.format(DATE_FORMAT).to_string(),
            has_instructions: record.has_instructions,
            approved: record.approval.is_some(),
            evaluated: record.eval.is_some(),
            eval_passed: record.eval.map(|e| e.passed),
            has_artifact: record.artifact.is_some(),
            has_modelfile: record.has_modelfile,
            rejected,
        }
    }
}

async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
) -> Result<Json<Vec<DatasetSummary>>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::OwnerOnly)?;
    let profile_root = ctx
        .user
        .profile_root
        .clone()
        .ok_or_else(|| MhError::internal("owner context missing a profile root"))?;

    let out_root = profile_root.join("out");
    let adapters_dir = out_root.join("adapters");
    let mut summaries = Vec::new();
    if adapters_dir.is_dir() {
        for entry in std::fs::read_dir(&adapters_dir)? {
            let entry = entry?;
            let Ok(file_type) = entry.file_type() else { continue };
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name == "_rejected" || name == "history-merged" {
                continue;
            }
            let Ok(date) = NaiveDate::parse_from_str(name, DATE_FORMAT) else {
                continue;
            };
            let record = DatasetRecord::load(&entry.path(), date)?;
            let rejected = mh_orchestrator::DatasetRecord::is_rejected(&out_root, date);
            summaries.push(DatasetSummary::from_record(&record, rejected));
        }
    }
    summaries.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(Json(summaries))
}

#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum AdaptersRequest {
    FullCycle {
        date: String,
        #[serde(default)]
        auto_approve: bool,
        #[serde(default)]
        dry_run: bool,
        #[serde(default = "default_base_model")]
        base_model: String,
        #[serde(default)]
        dual_adapter: bool,
    },
    CancelFullCycle {
        agent_name: String,
        #[serde(default)]
        model_name: Option<String>,
    },
    Reject {
        date: String,
        reason: String,
    },
}

fn default_base_model() -> String {
    std::env::var("METAHUMAN_BASE_MODEL").unwrap_or_else(|_| "llama3".to_string())
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum AdaptersResponse {
    AwaitingApproval,
    Activated { model_name: String, dataset: String },
    Cancelled { killed_pids: Vec<i32> },
    Rejected,
}

async fn dispatch(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
    Json(body): Json<AdaptersRequest>,
) -> Result<Json<AdaptersResponse>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::OwnerOnly)?;
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
        .ok_or_else(|| MhError::internal("owner context missing a profile root"))?;
    let cycle_user = CycleUser {
        user_id,
        username,
        profile_root,
    };

    let response = match body {
        AdaptersRequest::FullCycle {
            date,
            auto_approve,
            dry_run,
            base_model,
            dual_adapter,
        } => {
            let date = parse_date(&date)?;
            let options = RunOptions {
                auto_approve,
                dry_run,
                base_model,
                dual_adapter,
                actor: user_id,
            };
            match state.orchestrator.run(&cycle_user, date, &options).await? {
                CycleOutcome::AwaitingApproval => AdaptersResponse::AwaitingApproval,
                CycleOutcome::Activated(record) => AdaptersResponse::Activated {
                    model_name: record.model_name,
                    dataset: record.dataset.format(DATE_FORMAT).to_string(),
                },
            }
        }
        AdaptersRequest::CancelFullCycle {
            agent_name,
            model_name,
        } => {
            let outcome = state
                .orchestrator
                .cancel(&cycle_user, &agent_name, model_name.as_deref())
                .await?;
            AdaptersResponse::Cancelled {
                killed_pids: outcome.killed_pids,
            }
        }
        AdaptersRequest::Reject { date, reason } => {
            let date = parse_date(&date)?;
            state
                .orchestrator
                .reject(&cycle_user, date, reason, Some(user_id))?;
            AdaptersResponse::Rejected
        }
    };

    state.pipeline.record_action(
        &ctx.user,
        "adapters.dispatch",
        serde_json::json!({"response": serde_json::to_value(&response).ok()}),
    )?;

    Ok(Json(response))
}

fn parse_date(s: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| MhError::validation(format!("invalid date: {s}")).into())
}
