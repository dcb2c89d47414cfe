//! `tracing`/`tracing-subscriber`/`tracing-appender` initialization
//! (spec §10.B), adapted from the teacher's telemetry setup.

use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryResult;

/// Holds the non-blocking appender's worker guard. Dropping this flushes
/// buffered log lines; callers keep it alive for the lifetime of `main`.
pub struct LogGuard {
    _appender_guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Initialize the global `tracing` subscriber: an env-filtered fmt layer
/// on stderr plus a non-blocking rolling-file layer under
/// `<logs_dir>/run/`. `env_filter` falls back to `info` when
/// `RUST_LOG` is unset.
///
/// # Errors
/// Returns [`crate::TelemetryError`] if the log directory cannot be
/// created or the subscriber is already installed.
pub fn init(logs_dir: &Path, env_filter: &str) -> TelemetryResult<LogGuard> {
    let run_dir = logs_dir.join("run");
    std::fs::create_dir_all(&run_dir)?;

    let file_appender = tracing_appender::rolling::daily(&run_dir, "metahost.log");
    let (non_blocking, appender_guard) = tracing_appender::non_blocking(file_appender);

    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter());
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::TelemetryError::InitError(e.to_string()))?;

    Ok(LogGuard {
        _appender_guard: appender_guard,
    })
}
