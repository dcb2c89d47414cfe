//! System configuration (spec §10.C).
//!
//! Metahost has exactly one system-wide config file, `{install_root}/etc/
//! config.toml`, loaded once at boot by `mh-cli`'s `serve` command and
//! handed to `mh-server` as a plain value. It is deliberately not layered
//! the way astrid-config's is: there is no per-user or per-workspace
//! system config in this spec, only the per-user agent configuration at
//! `etc/agents.json`, which `mh-agents`' own `ConfigWatcher` hot-reloads
//! independently of this crate (spec §4.G).
//!
//! Four environment variables are read once at boot and folded into the
//! loaded [`SystemConfig`] as a startup-time override, never re-read per
//! request (spec §6): `HIGH_SECURITY`, `WETWARE_DECEASED`,
//! `HEADLESS_RUNTIME`, `METAHUMAN_BASE_MODEL`.
//!
//! # Example
//!
//! ```
//! use mh_config::load;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("config.toml");
//! let config = load(&path).unwrap();
//! assert_eq!(config.bind_address, "127.0.0.1:8080");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod loader;
mod types;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_file};
pub use types::{EnvOverrides, StartupPolicy, SystemConfig};
