//! `/api/profiles/*` (spec §6): listing, owner-driven creation, and
//! owner-or-self deletion.

use axum::extract::{Extension, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use mh_core::{MhError, Role};
use mh_identity::UserMetadata;
use mh_pipeline::{AuthGate, PipelineContext};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/profiles/list", get(list))
        .route("/api/profiles/create", post(create))
        .route("/api/profiles/delete", post(delete))
}

#[derive(Serialize)]
struct ProfileSummary {
    username: String,
    role: Role,
    display_name: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
) -> Result<Json<Vec<ProfileSummary>>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::PublicRead)?;

    let anonymous = !ctx.is_authenticated();
    let users = state.identity.list_users()?;
    let visible = users
        .into_iter()
        .filter(|u| !anonymous || u.metadata.profile_visibility == mh_identity::ProfileVisibility::Public)
        .map(|u| ProfileSummary {
            username: u.username,
            role: u.role,
            display_name: u.metadata.display_name,
        })
        .collect();

    Ok(Json(visible))
}

#[derive(Deserialize)]
struct CreateRequest {
    username: String,
    password: String,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Serialize)]
struct CreateResponse {
    username: String,
    role: Role,
}

async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
    Json(body): Json<CreateRequest>,
) -> Result<Json<CreateResponse>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::OwnerOnly)?;

    let metadata = UserMetadata {
        display_name: body.display_name,
        email: body.email,
        ..UserMetadata::default()
    };
    let role = body.role.unwrap_or(Role::Standard);
    if role == Role::Owner {
        return Err(MhError::validation("a profile cannot be created with the owner role").into());
    }
    let user = state
        .identity
        .create_user(&body.username, &body.password, role, metadata)?;

    state.pipeline.record_action(
        &ctx.user,
        "profiles.create",
        serde_json::json!({"username": user.username, "role": user.role}),
    )?;

    Ok(Json(CreateResponse {
        username: user.username,
        role: user.role,
    }))
}

#[derive(Deserialize)]
struct DeleteRequest {
    username: String,
    /// Must echo `username`, a confirmation guard against fat-fingered
    /// deletes (spec §6).
    confirm_username: String,
}

async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
    Json(body): Json<DeleteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::Authenticated)?;

    let is_owner = ctx.user.role == Role::Owner;
    let is_self = ctx.user.owns_profile(&body.username);
    if !is_owner && !is_self {
        return Err(MhError::forbidden("only an owner or the profile's own user may delete it").into());
    }
    if body.confirm_username != body.username {
        return Err(MhError::validation("confirm_username must match username").into());
    }

    let target = state
        .identity
        .get_user_by_username(&body.username)?
        .ok_or_else(|| MhError::not_found(format!("no such profile: {}", body.username)))?;

    let (profile_root, _) =
        mh_router::resolve_profile_root(&state.app_root, &target.username, target.metadata.profile_path.as_deref().map(std::path::Path::new));

    state.identity.delete_user(target.id)?;
    if profile_root.exists() {
        std::fs::remove_dir_all(&profile_root)?;
    }

    state.pipeline.record_action(
        &ctx.user,
        "profiles.delete",
        serde_json::json!({"username": target.username}),
    )?;

    Ok(Json(serde_json::json!({"ok": true})))
}
