//! Errors from loading and validating the system configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or validating [`crate::SystemConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but isn't valid TOML.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// The config file exists but couldn't be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A field failed validation after loading and applying env overrides.
    #[error("invalid config field `{field}`: {message}")]
    Validation {
        /// Dotted field path, e.g. `bind_address`.
        field: String,
        /// Human-readable description of the failure.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<&ConfigError> for mh_core::ErrorKind {
    fn from(_err: &ConfigError) -> Self {
        // A bad system config is only ever discovered at boot, never per
        // request, but the mapping exists so startup failures can reuse
        // the same reporting path as request-time validation errors.
        mh_core::ErrorKind::Validation
    }
}
