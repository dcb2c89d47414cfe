//! `/api/profile-path*` (spec §4.B, §4.E, §6): reading and changing a
//! user's profile root, and the streaming encrypt/decrypt endpoints.

use std::convert::Infallible;
use std::path::{Path, PathBuf};

use axum::extract::{Extension, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use mh_core::MhError;
use mh_pipeline::{AuthGate, PipelineContext};
use mh_vault::metadata::PasswordMode;
use mh_vault::progress::{ProgressEvent, Status};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/profile-path", get(get_profile_path).post(set_profile_path))
        .route("/api/profile-path/encrypt", post(encrypt))
        .route("/api/profile-path/decrypt", post(decrypt))
}

#[derive(Serialize)]
struct ProfilePathResponse {
    path: String,
    is_default: bool,
}

async fn get_profile_path(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
) -> Result<Json<ProfilePathResponse>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::Authenticated)?;
    let username = ctx.user.username.clone().ok_or_else(|| MhError::unauthenticated("no session"))?;
    let override_path = current_override(&state, &username)?;
    let (path, fallback_used) =
        mh_router::resolve_profile_root(&state.app_root, &username, override_path.as_deref());
    Ok(Json(ProfilePathResponse {
        path: path.display().to_string(),
        is_default: override_path.is_none() || fallback_used,
    }))
}

#[derive(Deserialize)]
struct SetProfilePathRequest {
    path: String,
}

async fn set_profile_path(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
    Json(body): Json<SetProfilePathRequest>,
) -> Result<Json<ProfilePathResponse>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::Authenticated)?;
    let username = ctx.user.username.clone().ok_or_else(|| MhError::unauthenticated("no session"))?;
    let current_root = ctx
        .user
        .profile_root
        .clone()
        .ok_or_else(|| MhError::internal("authenticated context missing a profile root"))?;

    let requested = PathBuf::from(&body.path);
    let (new_root, fallback_used) =
        mh_router::resolve_profile_root(&state.app_root, &username, Some(requested.as_path()));
    if fallback_used {
        return Err(MhError::validation("profile path is invalid or not usable").into());
    }

    if new_root != current_root {
        migrate_profile(&current_root, &new_root)?;
    }

    let mut user = state
        .identity
        .get_user_by_username(&username)?
        .ok_or_else(|| MhError::internal("session user vanished"))?;
    user.metadata.profile_path = Some(body.path.clone());
    state.identity.update_user(&user)?;

    state.pipeline.record_action(
        &ctx.user,
        "profile_path.set",
        serde_json::json!({"path": body.path}),
    )?;

    Ok(Json(ProfilePathResponse {
        path: new_root.display().to_string(),
        is_default: false,
    }))
}

fn current_override(state: &AppState, username: &str) -> Result<Option<PathBuf>, ApiError> {
    Ok(state
        .identity
        .get_user_by_username(username)?
        .and_then(|u| u.metadata.profile_path)
        .map(PathBuf::from))
}

/// Move every top-level entry from `from` into `to` (spec §6: "change
/// triggers atomic migration"). Each `rename` is atomic on a shared
/// filesystem; a failure partway through leaves already-moved entries
/// in `to` and the rest in `from`; the endpoint does not attempt to
/// roll a partial migration back.
fn migrate_profile(from: &Path, to: &Path) -> Result<(), ApiError> {
    if !from.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        std::fs::rename(entry.path(), dest)?;
    }
    Ok(())
}

#[derive(Deserialize)]
struct EncryptRequest {
    password: String,
    #[serde(default)]
    login_password_mode: bool,
}

async fn encrypt(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
    Json(body): Json<EncryptRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::OwnerOnly)?;
    let profile_root = ctx
        .user
        .profile_root
        .clone()
        .ok_or_else(|| MhError::internal("owner context missing a profile root"))?;

    let mode = if body.login_password_mode {
        PasswordMode::LoginPassword
    } else {
        PasswordMode::Separate
    };

    let (tx, rx) = tokio::sync::mpsc::channel(32);
    tokio::spawn(mh_vault::encrypt_profile(profile_root, body.password, mode, tx));

    state.pipeline.record_action(&ctx.user, "profile_path.encrypt", serde_json::json!({}))?;
    Ok(progress_sse(rx))
}

#[derive(Deserialize)]
struct DecryptRequest {
    password: String,
}

async fn decrypt(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
    Json(body): Json<DecryptRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::OwnerOnly)?;
    let profile_root = ctx
        .user
        .profile_root
        .clone()
        .ok_or_else(|| MhError::internal("owner context missing a profile root"))?;

    let (tx, rx) = tokio::sync::mpsc::channel(32);
    tokio::spawn(mh_vault::decrypt_profile(profile_root, body.password, tx));

    state.pipeline.record_action(&ctx.user, "profile_path.decrypt", serde_json::json!({}))?;
    Ok(progress_sse(rx))
}

fn progress_sse(
    mut rx: tokio::sync::mpsc::Receiver<ProgressEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let done = matches!(event.status, Status::Ok | Status::Error);
            let data = serde_json::to_string(&event).unwrap_or_default();
            yield Ok(Event::default().event("progress").data(data));
            if done {
                break;
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}
