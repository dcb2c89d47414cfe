//! Commonly used types for convenient import.
//!
//! Use `use mh_config::prelude::*;` to import all essential types.

pub use crate::{load, load_file, ConfigError, ConfigResult, EnvOverrides, StartupPolicy, SystemConfig};
