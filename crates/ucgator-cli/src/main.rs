//! UCGator CLI - terminal host for the UCGator client core
//!
//! Watches connectivity, queries and marks notifications, and manages the
//! access token and client config.

mod cli;
mod commands;
mod credentials;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::badge::run_badge;
use crate::commands::common::CliContext;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::network::run_watch_network;
use crate::commands::notifications::{run_read, run_read_all, run_unread};
use crate::credentials::KeyringCredentials;
use crate::error::CliError;

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
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ucgator=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_override = cli.config;
    let lookup_env = |key: &str| std::env::var(key).ok();
    let load_context = || CliContext::load(config_override.as_deref(), lookup_env);

    match cli.command {
        Commands::WatchNetwork { probe_url } => {
            run_watch_network(&load_context()?, probe_url).await
        }
        Commands::Unread { json } => run_unread(&load_context()?, json).await,
        Commands::Read { id } => run_read(&load_context()?, &id).await,
        Commands::ReadAll => run_read_all(&load_context()?).await,
        Commands::Badge { user, watch, json } => {
            run_badge(&load_context()?, &user, watch, json).await
        }
        Commands::Auth { command } => run_auth(command, &KeyringCredentials::from_env()),
        Commands::Config { command } => {
            run_config(command, config_override.as_deref(), lookup_env)
        }
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
    }
}
