//! Commonly used types for convenient import.
//!
//! Use `use mh_telemetry::prelude::*;` to import all essential types.

pub use crate::{init, LogGuard, TelemetryError, TelemetryResult};
