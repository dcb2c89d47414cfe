//! HTTP/SSE surface for the Metahost runtime (spec §4.I, §6).
//!
//! Wires every domain crate together behind a single axum [`Router`]:
//! `mh-pipeline` resolves the caller, the `routes` modules enforce the
//! per-route auth gate and call into `mh-identity`/`mh-router`/
//! `mh-vault`/`mh-agents`/`mh-orchestrator`, and `error` translates
//! whatever comes back into the response shape spec §7 describes.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod cookie;
pub mod error;
pub mod routes;
pub mod state;

pub use axum::Router;
pub use state::AppState;

/// Build the complete `mh-server` router for `state`.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    routes::build(state)
}
