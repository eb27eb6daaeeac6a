//! Worldkeeper CLI - self-scheduling world backups
//!
//! This is the main entry point for the worldkeeper command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use worldkeeper_core::SettingsLoader;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.quiet);

    let loader = SettingsLoader::with_dir(cli.config_dir);

    // Run command
    match cli.command {
        Commands::Run(args) => commands::run::run(args, &loader).await,
        Commands::Backup(args) => commands::backup::run(args, &loader).await,
        Commands::List(args) => commands::list::run(args),
        Commands::Prune(args) => commands::prune::run(args, &loader),
        Commands::Config(args) => commands::config::run(args, &loader),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Backup completion lines are logged at info
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
