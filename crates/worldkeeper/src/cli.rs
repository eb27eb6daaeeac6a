//! CLI argument parsing with clap

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use worldkeeper_core::{ArtifactMode, BackupSettings};

// Re-export command types for convenience
pub use crate::commands::backup::BackupArgs;
pub use crate::commands::config::ConfigCommands;
pub use crate::commands::list::ListArgs;
pub use crate::commands::prune::PruneArgs;
pub use crate::commands::run::RunArgs;

/// Worldkeeper - self-scheduling world backups for game servers
#[derive(Parser, Debug)]
#[command(name = "worldkeeper")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory containing worldkeeper.yaml
    #[arg(long, global = true, env = "WORLDKEEPER_CONFIG_DIR", default_value = ".")]
    pub config_dir: Utf8PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the backup worker until interrupted
    Run(RunArgs),

    /// Take one backup now
    Backup(BackupArgs),

    /// List existing backups
    List(ListArgs),

    /// Delete backups older than the retention window
    Prune(PruneArgs),

    /// Settings management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Location of the game server's saves
#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Server directory containing Level/ and Players/
    #[arg(long)]
    pub server_dir: Utf8PathBuf,

    /// Name of the world to back up
    #[arg(long)]
    pub world: String,
}

/// Location of the backups
#[derive(Args, Debug)]
pub struct DataDirArgs {
    /// Data directory; backups go to <data-dir>/Backups
    #[arg(long)]
    pub data_dir: Utf8PathBuf,
}

/// Per-invocation overrides of worldkeeper.yaml
#[derive(Args, Debug, Default)]
pub struct SettingsOverrides {
    /// Minutes between backups
    #[arg(long, allow_negative_numbers = true)]
    pub interval_minutes: Option<i64>,

    /// Seconds to wait for the world save before copying
    #[arg(long, allow_negative_numbers = true)]
    pub save_wait_seconds: Option<i64>,

    /// Delete backups older than this many days (0 keeps everything)
    #[arg(long, allow_negative_numbers = true)]
    pub retention_days: Option<i64>,

    /// Keep the backup directory only, or also write <backup-id>.zip
    #[arg(long)]
    pub artifact: Option<ArtifactMode>,
}

impl SettingsOverrides {
    /// Layer the flags over loaded settings, validating the result
    pub fn apply(&self, settings: BackupSettings) -> Result<BackupSettings> {
        Ok(BackupSettings::from_signed(
            self.interval_minutes
                .unwrap_or(settings.backup_interval_minutes as i64),
            self.save_wait_seconds
                .unwrap_or(settings.pre_backup_save_wait_seconds as i64),
            self.retention_days
                .unwrap_or(settings.remove_backups_older_than_days as i64),
            self.artifact.unwrap_or(settings.artifact),
        )?)
    }
}
