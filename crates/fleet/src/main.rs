// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fleet - real-time vehicle location hub.
//!
//! This is the binary entry point for the hub.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fleet_config::FleetConfig;

/// Fleet - real-time vehicle location hub.
#[derive(Parser, Debug)]
#[command(name = "fleet", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the hub server.
    Serve,
    /// Validate the configuration and exit.
    CheckConfig,
}

fn load_config(path: Option<&std::path::Path>) -> FleetConfig {
    let result = match path {
        Some(path) => fleet_config::load_and_validate_path(path),
        None => fleet_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            fleet_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("fleet: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => {
            println!(
                "fleet: config ok (listen {}:{}, database {})",
                config.server.host, config.server.port, config.storage.database_path
            );
        }
        None => {
            println!("fleet: use --help for available commands");
        }
    }
}
