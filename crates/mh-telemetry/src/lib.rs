//! Structured logging setup for the Metahost runtime (spec §10.B).
//!
//! `mh-cli`/`mh-server` call [`init`] once from `main()`. It wires
//! `tracing-subscriber`'s env-filter and fmt layers to stderr, plus a
//! non-blocking `tracing-appender` rolling file sink under
//! `logs/run/*.log` (spec §6's durable layout). Audit records (spec
//! §4.D step 5) are a separate NDJSON channel owned by `mh-audit` — they
//! are data, not diagnostics, and are never routed through `tracing`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init, LogGuard};
