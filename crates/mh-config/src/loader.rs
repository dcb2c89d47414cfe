//! Loads the system configuration: `{install_root}/etc/config.toml` with
//! `serde(default)` tolerant fields, then the four environment variable
//! overrides from spec §6 applied once, at boot.
//!
//! Grounded on astrid-config's `loader.rs` read-then-merge shape,
//! collapsed from its five-layer precedence chain down to the one file
//! this system has plus an env-var pass (spec §10.C).

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{EnvOverrides, SystemConfig};

/// Load the system config from `path`, applying [`EnvOverrides::from_env`]
/// on top. A missing file is not an error — it resolves to
/// [`SystemConfig::default`], same as astrid-config's tolerant stance on
/// an absent layer.
pub fn load(path: &Path) -> ConfigResult<SystemConfig> {
    let mut config = load_file(path)?;
    EnvOverrides::from_env().apply(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Load `path` without applying environment overrides or validation —
/// used by `mh doctor` to show the file's contents on their own.
pub fn load_file(path: &Path) -> ConfigResult<SystemConfig> {
    match std::fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(SystemConfig::default()),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn validate(config: &SystemConfig) -> ConfigResult<()> {
    if config.bind_address.parse::<std::net::SocketAddr>().is_err() {
        return Err(ConfigError::Validation {
            field: "bind_address".to_owned(),
            message: format!("`{}` is not a valid socket address", config.bind_address),
        });
    }
    if config.base_model.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "base_model".to_owned(),
            message: "must not be empty".to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let config = load_file(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not valid [[[ toml").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn bad_bind_address_fails_validation() {
        let config = SystemConfig {
            bind_address: "not-an-address".to_owned(),
            ..SystemConfig::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field, .. } if field == "bind_address"));
    }

    #[test]
    fn valid_file_loads_and_passes_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, r#"bind_address = "0.0.0.0:9000""#).unwrap();
        let config = load_file(&path).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:9000");
    }
}
