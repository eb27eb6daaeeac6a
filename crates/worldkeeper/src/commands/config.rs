//! Config command

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use worldkeeper_core::SettingsLoader;

use crate::output;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write worldkeeper.yaml with the default settings
    Init(ConfigInitArgs),

    /// Show the effective settings (file plus environment)
    Show,
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(command: ConfigCommands, loader: &SettingsLoader) -> Result<()> {
    match command {
        ConfigCommands::Init(args) => init(args, loader),
        ConfigCommands::Show => show(loader),
    }
}

fn init(args: ConfigInitArgs, loader: &SettingsLoader) -> Result<()> {
    let path = loader
        .write_defaults(args.force)
        .context("Failed to write default settings")?;
    output::success(&format!("Wrote default settings to {}", path));
    Ok(())
}

fn show(loader: &SettingsLoader) -> Result<()> {
    let settings = loader
        .load()
        .with_context(|| format!("Failed to load settings from {}", loader.config_dir()))?;

    output::header("Settings");
    let path = loader.settings_path();
    if path.exists() {
        output::kv("File", path.as_str());
    } else {
        output::kv("File", &format!("{} (not found, using defaults)", path));
    }
    output::kv(
        "backup-interval-minutes",
        &settings.backup_interval_minutes.to_string(),
    );
    output::kv(
        "pre-backup-save-wait-seconds",
        &settings.pre_backup_save_wait_seconds.to_string(),
    );
    output::kv(
        "remove-backups-older-than-days",
        &settings.remove_backups_older_than_days.to_string(),
    );
    output::kv("artifact", &settings.artifact.to_string());
    Ok(())
}
