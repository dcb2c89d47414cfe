//! `mh doctor` (spec §6): report installation health without mutating
//! anything beyond the directory scaffold itself.

use mh_identity::IdentityStore;

use crate::error::CliError;

pub fn run() -> Result<(), CliError> {
    let app_root = super::open_app_root()?;
    println!("install root: {}", app_root.root().display());

    let config_path = app_root.system_config_file();
    match mh_config::load_file(&config_path) {
        Ok(config) => {
            println!("config file: {} (present)", config_path.display());
            println!("  bind_address: {}", config.bind_address);
            println!("  base_model: {}", config.base_model);
            println!(
                "  startup: high_security={} wetware_deceased={} headless_runtime={}",
                config.startup.high_security,
                config.startup.wetware_deceased,
                config.startup.headless_runtime
            );
        }
        Err(e) => println!("config file: {} ({e})", config_path.display()),
    }

    let identity = IdentityStore::new(&app_root);
    match identity.is_empty() {
        Ok(true) => println!("users: none registered yet (next `mh register` becomes owner)"),
        Ok(false) => {
            let count = identity.list_users()?.len();
            println!("users: {count} registered");
        }
        Err(e) => println!("users: could not read identity store ({e})"),
    }

    let registry_path = app_root.agent_registry_path();
    println!(
        "agent registry: {} ({})",
        registry_path.display(),
        if registry_path.exists() { "present" } else { "not yet created" }
    );

    Ok(())
}
