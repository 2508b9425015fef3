//! Jot CLI - Command-line interface for Jot notes
//!
//! Reads are served from the local cache; writes made while the backend is
//! unreachable are queued and can be replayed with `sync` inside `jot shell`.

mod cli;
mod commands;
mod config_file;
mod error;
mod secret_store;
mod session;
mod shell;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config_file::{default_config_path, CliConfig};
use crate::error::CliError;
use crate::session::Session;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jot=info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    if let Commands::Config { command } = cli.command {
        return commands::config::run_config(command, &config_path, cli.base_url, cli.cache_path);
    }

    let file_config = CliConfig::load_from_path(&config_path)?;
    let restore_backend = cli.base_url.is_none();
    let client_config = file_config.client_config(cli.base_url)?;
    let cache_path = file_config.cache_path(cli.cache_path)?;
    let mut session = Session::open(&client_config, &cache_path, restore_backend)?;

    let result = match cli.command {
        Commands::Shell => shell::run_shell(&mut session).await,
        command => commands::dispatch(&session, command).await,
    };
    session.finish().await;
    result
}
