//! Temp-directory-backed installation and profile fixtures.

use std::path::PathBuf;

use mh_core::{AppRoot, Role, UserId};
use mh_identity::{IdentityStore, User, UserMetadata};

/// A freshly `ensure()`-d installation root backed by a [`tempfile::TempDir`].
/// Drop order matters: keep the `TempDir` alive for as long as the
/// `AppRoot` is in use, or the directory is removed out from under it.
pub struct TestInstall {
    /// Keeps the temp directory alive; never read directly.
    pub dir: tempfile::TempDir,
    /// The installation root inside `dir`.
    pub app_root: AppRoot,
}

/// Create a fresh installation root under a new temp directory.
#[must_use]
pub fn test_install() -> TestInstall {
    let dir = tempfile::tempdir().expect("create temp dir");
    let app_root = AppRoot::at(dir.path());
    app_root.ensure().expect("scaffold install root");
    TestInstall { dir, app_root }
}

/// Register a user against `app_root`'s identity store and return them.
/// The first call against a fresh install becomes the owner regardless of
/// `role`, matching `IdentityStore::create_user`'s own bootstrap rule.
pub fn test_user(app_root: &AppRoot, username: &str, role: Role) -> User {
    let identity = IdentityStore::new(app_root);
    identity
        .create_user(username, "correct-horse-battery-staple", role, UserMetadata::default())
        .expect("create test user")
}

/// Build a [`mh_orchestrator::CycleUser`] pointing at a freshly-created
/// profile directory under `app_root`'s default profile layout.
#[must_use]
pub fn test_cycle_user(app_root: &AppRoot, username: &str) -> mh_orchestrator::CycleUser {
    let profile_root: PathBuf = app_root.default_profile_dir(username);
    std::fs::create_dir_all(&profile_root).expect("create profile root");
    mh_orchestrator::CycleUser {
        user_id: UserId::new(),
        username: username.to_string(),
        profile_root,
    }
}
