//! Router assembly and the request-context middleware (spec §4.D, §4.I).
//!
//! Every route — public or not — passes through [`resolve_context`]
//! first, which always succeeds (an absent or invalid session just
//! resolves to an anonymous [`PipelineContext`], per spec §4.D step 1)
//! and stashes the result as a request extension. Handlers then call
//! `state.pipeline.authorize(&ctx.user, AuthGate::X)` themselves with
//! whatever gate their route needs, since the gate varies per route
//! (`PublicRead`/`Authenticated`/`OwnerOnly`/...) rather than splitting
//! cleanly into a public/protected binary the way
//! `sblanchard-SerialAgent`'s gateway does.

mod adapters;
mod agents;
mod auth;
mod profile_path;
mod profiles;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use mh_pipeline::RequestMeta;
use tower_cookies::{Cookies, CookieManagerLayer};
use tower_http::trace::TraceLayer;

use crate::cookie::SESSION_COOKIE;
use crate::error::ApiError;
use crate::state::AppState;

/// Assemble the full `mh-server` router (spec §6's route table).
pub fn build(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(profiles::router())
        .merge(profile_path::router())
        .merge(agents::router())
        .merge(adapters::router())
        .layer(middleware::from_fn_with_state(state.clone(), resolve_context))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve the `mh_session` cookie (if any) into a [`mh_pipeline::PipelineContext`]
/// and insert it as a request extension (spec §4.D steps 1-2).
///
/// `CookieManagerLayer` must sit outside this middleware (added later in
/// [`build`], which makes it run first on an inbound request) so the
/// `Cookies` extractor below is already populated.
async fn resolve_context(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session_cookie = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let meta = RequestMeta {
        session_cookie,
        user_agent,
        ip,
    };
    let ctx = state.pipeline.build_context(&meta)?;
    request.extensions_mut().insert(ctx);

    Ok(next.run(request).await)
}
