// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sokoni - conversational-commerce agent service.
//!
//! Binary entry point: loads configuration, initializes tracing, and
//! runs the agent service until a shutdown signal arrives.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;

/// Sokoni - conversational-commerce agent service.
#[derive(Parser, Debug)]
#[command(name = "sokoni", version, about, long_about = None)]
struct Cli {
    /// Explicit config file, bypassing the XDG lookup chain.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the agent service.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => sokoni_config::load_config_from_path(path),
        None => sokoni_config::load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sokoni: configuration error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Some(Commands::Serve) | None => serve::run_serve(config).await,
    };
    if let Err(e) = result {
        eprintln!("sokoni: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
