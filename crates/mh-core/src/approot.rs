//! Installation-root directory scaffolding.
//!
//! One `AppRoot` per process. It owns the directories that are not part of
//! any single user's profile: the default parent of all profile roots, the
//! process-wide logs, and the agent registry file (spec §4.F).

use std::path::{Path, PathBuf};

use crate::error::{MhError, MhResult};

const ENV_HOME: &str = "METAHOST_HOME";

/// Resolved, existing installation root.
#[derive(Debug, Clone)]
pub struct AppRoot {
    root: PathBuf,
}

impl AppRoot {
    /// Resolve the installation root from `$METAHOST_HOME`, falling back to
    /// `$HOME/.metahost`. Does not create anything; call [`Self::ensure`]
    /// after resolving.
    pub fn resolve() -> MhResult<Self> {
        let root = match std::env::var(ENV_HOME) {
            Ok(val) if !val.trim().is_empty() => {
                let path = PathBuf::from(&val);
                if !path.is_absolute() {
                    return Err(MhError::validation(format!(
                        "{ENV_HOME} must be an absolute path, got {val:?}"
                    )));
                }
                path
            }
            _ => {
                let home = std::env::var("HOME")
                    .map_err(|_| MhError::internal("HOME is not set and METAHOST_HOME is unset"))?;
                PathBuf::from(home).join(".metahost")
            }
        };
        Ok(Self { root })
    }

    /// Build an `AppRoot` rooted at an explicit path, bypassing env
    /// resolution. Used by tests and by `mh-test` fixtures.
    #[must_use]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create every top-level directory this root owns, with restrictive
    /// permissions on unix.
    pub fn ensure(&self) -> MhResult<()> {
        for dir in [
            self.root.clone(),
            self.profiles_dir(),
            self.system_logs_dir(),
            self.system_agents_dir(),
            self.system_etc_dir(),
            self.system_brain_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))?;
            }
        }
        Ok(())
    }

    /// The root directory itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parent directory of all default profile roots.
    #[must_use]
    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join("profiles")
    }

    /// Default profile root for a username (spec §4.B.1).
    #[must_use]
    pub fn default_profile_dir(&self, username: &str) -> PathBuf {
        self.profiles_dir().join(username)
    }

    /// Process-wide logs (`category=system`, subcategory `logs`).
    #[must_use]
    pub fn system_logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Agent registry directory (`category=system`, subcategory `agents`).
    #[must_use]
    pub fn system_agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    /// Path of the durable agent registry mirror file (spec §4.F).
    #[must_use]
    pub fn agent_registry_path(&self) -> PathBuf {
        self.system_agents_dir().join("registry.json")
    }

    /// Process-wide config (`category=system`, subcategory `etc`).
    #[must_use]
    pub fn system_etc_dir(&self) -> PathBuf {
        self.root.join("etc")
    }

    /// Internal-only model/brain storage (`category=system`, subcategory
    /// `brain`). Never resolved for user-role callers (spec §4.B.1).
    #[must_use]
    pub fn system_brain_dir(&self) -> PathBuf {
        self.root.join("brain")
    }

    /// Durable user record store (spec §4.A), keyed by username.
    #[must_use]
    pub fn users_file(&self) -> PathBuf {
        self.system_etc_dir().join("users.json")
    }

    /// Durable session store (spec §4.A), keyed by session id.
    #[must_use]
    pub fn sessions_file(&self) -> PathBuf {
        self.system_etc_dir().join("sessions.json")
    }

    /// System-wide configuration file (spec §10.C).
    #[must_use]
    pub fn system_config_file(&self) -> PathBuf {
        self.system_etc_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_creates_all_system_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let app_root = AppRoot::at(tmp.path());
        app_root.ensure().unwrap();
        assert!(app_root.profiles_dir().is_dir());
        assert!(app_root.system_logs_dir().is_dir());
        assert!(app_root.system_agents_dir().is_dir());
        assert!(app_root.system_etc_dir().is_dir());
        assert!(app_root.system_brain_dir().is_dir());
    }

    #[test]
    fn rejects_non_absolute_env_override() {
        // SAFETY: test-only, no other thread touches this env var concurrently
        // within this process's test binary invocation of this test.
        unsafe {
            std::env::set_var(ENV_HOME, "relative/path");
        }
        let result = AppRoot::resolve();
        unsafe {
            std::env::remove_var(ENV_HOME);
        }
        assert!(result.is_err());
    }
}
