//! Prune command

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use worldkeeper_backup::{backup_root, RetentionPruner};
use worldkeeper_core::{BackupSettings, SettingsLoader};

use crate::cli::DataDirArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct PruneArgs {
    #[command(flatten)]
    pub data: DataDirArgs,

    /// Retention window in days, instead of the configured one
    #[arg(long, allow_negative_numbers = true)]
    pub days: Option<i64>,
}

pub fn run(args: PruneArgs, loader: &SettingsLoader) -> Result<()> {
    let mut settings = loader
        .load()
        .with_context(|| format!("Failed to load settings from {}", loader.config_dir()))?;
    if let Some(days) = args.days {
        settings = BackupSettings::from_signed(
            settings.backup_interval_minutes as i64,
            settings.pre_backup_save_wait_seconds as i64,
            days,
            settings.artifact,
        )?;
    }

    let root = backup_root(&args.data.data_dir);
    let pruner = RetentionPruner::from_settings(&root, &settings);
    if pruner.window().is_none() {
        output::info("Retention is disabled (0 days); nothing to prune");
        return Ok(());
    }

    let removed = pruner
        .prune(Utc::now())
        .with_context(|| format!("Failed to prune backups in {}", root.display()))?;

    if removed.is_empty() {
        output::info(&format!(
            "No backups older than {} days",
            settings.remove_backups_older_than_days
        ));
    } else {
        for unit in &removed {
            output::kv("Removed", &unit.id.to_string());
        }
        output::success(&format!("Pruned {} backups", removed.len()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use chrono::Duration;
    use std::fs;
    use tempfile::TempDir;
    use worldkeeper_backup::BackupId;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    #[test]
    fn test_prune_with_days_override() {
        let temp = TempDir::new().unwrap();
        let root = backup_root(temp.path().join("data"));
        let now = Utc::now();
        let old = root.join(BackupId::from_datetime(now - Duration::days(10)).to_string());
        let recent = root.join(BackupId::from_datetime(now - Duration::hours(1)).to_string());
        let operator = root.join("2024");
        for dir in [&old, &recent, &operator] {
            fs::create_dir_all(dir).unwrap();
        }

        let args = PruneArgs {
            data: DataDirArgs {
                data_dir: utf8(&temp.path().join("data")),
            },
            days: Some(3),
        };
        run(args, &SettingsLoader::with_dir(utf8(temp.path()))).unwrap();

        assert!(!old.exists());
        assert!(recent.exists());
        assert!(operator.exists());
    }

    #[test]
    fn test_negative_days_rejected() {
        let temp = TempDir::new().unwrap();
        let args = PruneArgs {
            data: DataDirArgs {
                data_dir: utf8(temp.path()),
            },
            days: Some(-2),
        };
        assert!(run(args, &SettingsLoader::with_dir(utf8(temp.path()))).is_err());
    }
}
