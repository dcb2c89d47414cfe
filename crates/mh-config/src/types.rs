//! The system configuration shape (spec §10.C): install root, bind
//! address, base model, and the startup policy flags the four boot-time
//! environment variables (spec §6) override.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_owned()
}

fn default_base_model() -> String {
    "llama3".to_owned()
}

/// The on-disk system configuration, `{install_root}/etc/config.toml`.
/// Every field tolerates omission (`serde(default)`) so a file written by
/// an older build still loads under a newer one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Overrides [`mh_core::AppRoot::resolve`]'s default install root
    /// when set.
    pub install_root: Option<PathBuf>,
    /// Address the HTTP/SSE surface (spec §4.I) binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Default base model name used for Modelfile generation (spec §4.H),
    /// overridden at boot by `METAHUMAN_BASE_MODEL` if set.
    #[serde(default = "default_base_model")]
    pub base_model: String,
    /// Startup policy flags (spec §3, §6).
    pub startup: StartupPolicy,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            install_root: None,
            bind_address: default_bind_address(),
            base_model: default_base_model(),
            startup: StartupPolicy::default(),
        }
    }
}

/// Boot-time behavior flags. A file value is the fallback; the matching
/// environment variable in [`EnvOverrides`] always wins when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupPolicy {
    /// Forces `emulation` + read-only at boot and blocks further mode
    /// changes (`HIGH_SECURITY`, spec §3). Feeds directly into
    /// [`mh_core::CognitiveModeCell::new`].
    pub high_security: bool,
    /// Disables dual-consciousness mode entirely (`WETWARE_DECEASED`).
    pub wetware_deceased: bool,
    /// Pauses all non-essential agents at boot (`HEADLESS_RUNTIME`).
    pub headless_runtime: bool,
}

/// The four environment variable overrides read once at boot (spec §6),
/// kept as an explicit value rather than re-read from the process
/// environment on every access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// `HIGH_SECURITY ∈ {true,false}`.
    pub high_security: Option<bool>,
    /// `WETWARE_DECEASED ∈ {true,false}`.
    pub wetware_deceased: Option<bool>,
    /// `HEADLESS_RUNTIME ∈ {true,false}`.
    pub headless_runtime: Option<bool>,
    /// `METAHUMAN_BASE_MODEL`, non-empty.
    pub base_model: Option<String>,
}

impl EnvOverrides {
    /// Read the four override variables from the process environment.
    /// Malformed boolean values (anything but `true`/`false`) are ignored
    /// with a warning rather than rejected at boot.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            high_security: read_bool_env("HIGH_SECURITY"),
            wetware_deceased: read_bool_env("WETWARE_DECEASED"),
            headless_runtime: read_bool_env("HEADLESS_RUNTIME"),
            base_model: std::env::var("METAHUMAN_BASE_MODEL")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }

    /// Apply the overrides present in `self` onto `config`, in place.
    pub fn apply(&self, config: &mut SystemConfig) {
        if let Some(v) = self.high_security {
            config.startup.high_security = v;
        }
        if let Some(v) = self.wetware_deceased {
            config.startup.wetware_deceased = v;
        }
        if let Some(v) = self.headless_runtime {
            config.startup.headless_runtime = v;
        }
        if let Some(model) = &self.base_model {
            config.base_model = model.clone();
        }
    }
}

fn read_bool_env(name: &str) -> Option<bool> {
    match std::env::var(name).ok()?.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        other => {
            tracing::warn!(name, value = other, "ignoring malformed boolean env var");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_config_round_trips_through_toml() {
        let config = SystemConfig {
            install_root: Some(PathBuf::from("/srv/metahost")),
            bind_address: "0.0.0.0:9000".to_owned(),
            base_model: "llama3:70b".to_owned(),
            startup: StartupPolicy {
                high_security: true,
                wetware_deceased: false,
                headless_runtime: true,
            },
        };
        let raw = toml::to_string(&config).unwrap();
        let back: SystemConfig = toml::from_str(&raw).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn empty_toml_deserializes_to_defaults() {
        let config: SystemConfig = toml::from_str("").unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    fn partial_toml_keeps_remaining_fields_default() {
        let config: SystemConfig = toml::from_str(r#"bind_address = "0.0.0.0:80""#).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:80");
        assert_eq!(config.base_model, default_base_model());
        assert!(!config.startup.high_security);
    }

    #[test]
    fn env_overrides_apply_only_when_present() {
        let overrides = EnvOverrides {
            high_security: Some(true),
            wetware_deceased: None,
            headless_runtime: None,
            base_model: Some("llama3:8b".to_owned()),
        };
        let mut config = SystemConfig::default();
        overrides.apply(&mut config);
        assert!(config.startup.high_security);
        assert!(!config.startup.headless_runtime);
        assert_eq!(config.base_model, "llama3:8b");
    }
}
