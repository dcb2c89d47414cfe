//! `mh login` (spec §6): a local credential check. `mh-cli` has no
//! browser session to hold a cookie in, so this just confirms the
//! password and reports the role the HTTP surface would grant.

use mh_core::MhError;
use mh_identity::IdentityStore;

use crate::error::CliError;

pub fn run(username: &str, password: &str) -> Result<(), CliError> {
    let app_root = super::open_app_root()?;
    let identity = IdentityStore::new(&app_root);

    let Some(user) = identity.authenticate(username, password)? else {
        return Err(MhError::unauthenticated("invalid username or password").into());
    };

    println!("ok: {username} authenticates as {:?}", user.role);
    Ok(())
}
