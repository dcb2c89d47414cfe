//! `mh register` (spec §4.A, §6): create a user; the first one
//! registered against a fresh installation becomes the owner regardless
//! of `--role`.

use mh_core::Role;
use mh_identity::{IdentityStore, UserMetadata};

use crate::error::CliError;

const RECOVERY_CODE_COUNT: usize = 10;

pub fn run(
    username: &str,
    password: &str,
    role: Role,
    display_name: Option<String>,
    email: Option<String>,
) -> Result<(), CliError> {
    let app_root = super::open_app_root()?;
    let identity = IdentityStore::new(&app_root);

    let metadata = UserMetadata {
        display_name,
        email,
        ..UserMetadata::default()
    };
    let user = identity.create_user(username, password, role, metadata)?;
    let codes = identity.generate_recovery_codes(user.id, RECOVERY_CODE_COUNT)?;

    println!("registered {username} as {:?}", user.role);
    println!("recovery codes (shown once, store them somewhere safe):");
    for code in codes {
        println!("  {code}");
    }
    Ok(())
}
