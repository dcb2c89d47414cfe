//! One module per subcommand (spec §6).

pub mod doctor;
pub mod login;
pub mod register;
pub mod serve;

/// Build, resolve, and `ensure()` the installation root every command
/// needs before doing anything else.
pub fn open_app_root() -> Result<mh_core::AppRoot, crate::error::CliError> {
    let app_root = mh_core::AppRoot::resolve()?;
    app_root.ensure()?;
    Ok(app_root)
}
