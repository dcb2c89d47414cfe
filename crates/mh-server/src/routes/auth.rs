//! `/api/auth/*` (spec §6): register, login, logout, current-session
//! introspection, and recovery-code password reset.

use axum::extract::{Extension, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use mh_core::{MhError, Role};
use mh_crypto::PasswordHash;
use mh_identity::{StoredHash, UserMetadata};
use mh_pipeline::{AuthGate, PipelineContext};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::cookie::{self, CROSS_ORIGIN_HEADER};
use crate::error::ApiError;
use crate::state::AppState;

/// Recovery codes issued at registration time (spec §6: "returns
/// recovery codes once").
const RECOVERY_CODE_COUNT: usize = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/auth/reset-password", post(reset_password))
}

#[derive(Deserialize)]
struct RegisterRequest {
    username: String,
    password: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Serialize)]
struct RegisterResponse {
    role: Role,
    recovery_codes: Vec<String>,
}

async fn register(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::PublicRead)?;

    let metadata = UserMetadata {
        display_name: body.display_name,
        email: body.email,
        ..UserMetadata::default()
    };
    let user = state
        .identity
        .create_user(&body.username, &body.password, Role::Standard, metadata)?;
    let recovery_codes = state
        .identity
        .generate_recovery_codes(user.id, RECOVERY_CODE_COUNT)?;

    state
        .pipeline
        .record_action(&ctx.user, "auth.register", serde_json::json!({"username": user.username}))?;

    Ok(Json(RegisterResponse {
        role: user.role,
        recovery_codes,
    }))
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    role: Role,
    username: String,
}

async fn login(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
    headers: axum::http::HeaderMap,
    cookies: Cookies,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::PublicRead)?;

    let Some(user) = state.identity.authenticate(&body.username, &body.password)? else {
        state.pipeline.record_denied(
            &ctx.user,
            "auth.login_failed",
            &MhError::unauthenticated("invalid credentials"),
        )?;
        return Err(MhError::unauthenticated("invalid username or password").into());
    };

    let session = state
        .identity
        .create_session(user.id, user.role, user_agent(&headers), None)?;

    let cross_origin = headers
        .get(CROSS_ORIGIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    cookies.add(cookie::build(session.id, cross_origin));

    state
        .pipeline
        .record_action(&ctx.user, "auth.login", serde_json::json!({"username": user.username}))?;

    Ok(Json(LoginResponse {
        role: user.role,
        username: user.username,
    }))
}

async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
    cookies: Cookies,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::Authenticated)?;

    if let Some(session) = &ctx.session {
        state.identity.delete_session(session.id)?;
    }
    if let Some(user_id) = ctx.user.user_id {
        state.key_cache.lock(user_id).await;
    }
    cookies.add(cookie::removal());

    state.pipeline.record_action(&ctx.user, "auth.logout", serde_json::json!({}))?;

    Ok(Json(serde_json::json!({"ok": true})))
}

#[derive(Serialize)]
struct MeResponse {
    role: Option<Role>,
    username: Option<String>,
}

async fn me(Extension(ctx): Extension<PipelineContext>) -> Json<MeResponse> {
    Json(MeResponse {
        role: ctx.is_authenticated().then_some(ctx.user.role),
        username: ctx.user.username.clone(),
    })
}

#[derive(Deserialize)]
struct ResetPasswordRequest {
    username: String,
    recovery_code: String,
    new_password: String,
}

async fn reset_password(
    State(state): State<AppState>,
    Extension(ctx): Extension<PipelineContext>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.pipeline.authorize(&ctx.user, AuthGate::PublicRead)?;

    let mut user = state
        .identity
        .consume_recovery_code(&body.username, &body.recovery_code)?;

    let hash = PasswordHash::new(&body.new_password)
        .map_err(|e| MhError::validation(e.to_string()))?;
    user.password_hash = StoredHash::from_hash(&hash);
    state.identity.update_user(&user)?;

    state
        .pipeline
        .record_action(&ctx.user, "auth.reset_password", serde_json::json!({"username": user.username}))?;

    Ok(Json(serde_json::json!({"ok": true})))
}

fn user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
