//! `mh` - Metahost command-line interface.
//!
//! A thin front door over the domain crates: `register`/`login` talk to
//! `mh-identity` directly, `doctor` inspects the installation, and `serve`
//! boots the full runtime and hosts `mh-server`'s router in this process.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod commands;
mod error;

use clap::{Parser, Subcommand};
use mh_core::Role;

use error::CliError;

/// Metahost - local-first digital persona runtime.
#[derive(Parser)]
#[command(name = "mh")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new profile. The first registration on a fresh
    /// installation becomes the owner regardless of `--role`.
    Register {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "standard")]
        role: Role,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Check a username and password against the identity store.
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Start the HTTP/SSE surface and the agent scheduler.
    Serve,
    /// Report installation health: config, identity store, agent registry.
    Doctor,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Register {
            username,
            password,
            role,
            display_name,
            email,
        } => commands::register::run(&username, &password, role, display_name, email),
        Commands::Login { username, password } => commands::login::run(&username, &password),
        Commands::Serve => commands::serve::run().await,
        Commands::Doctor => commands::doctor::run(),
    };

    if let Err(err) = result {
        exit_with(err);
    }
}

fn exit_with(err: CliError) -> ! {
    eprintln!("error: {err}");
    std::process::exit(err.exit_code());
}
