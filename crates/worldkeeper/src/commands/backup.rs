//! Backup command: one backup right now, without waiting or saving first

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use tracing::debug;
use worldkeeper_backup::{backup_root, BackupCycle, DirectoryHost, SaveTrigger};
use worldkeeper_core::SettingsLoader;

use crate::cli::{DataDirArgs, ServerArgs, SettingsOverrides};
use crate::output;

#[derive(Args, Debug)]
pub struct BackupArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub data: DataDirArgs,

    #[command(flatten)]
    pub overrides: SettingsOverrides,
}

/// The operator is expected to have saved the world already
struct NoSave;

impl SaveTrigger for NoSave {
    fn request_save(&self) {
        debug!("One-off backup does not trigger a world save");
    }
}

pub async fn run(args: BackupArgs, loader: &SettingsLoader) -> Result<()> {
    output::header("Backup World");

    let settings = args.overrides.apply(
        loader
            .load()
            .with_context(|| format!("Failed to load settings from {}", loader.config_dir()))?,
    )?;
    let root = backup_root(&args.data.data_dir);

    output::kv("World", &args.server.world);
    output::kv("Server", args.server.server_dir.as_str());
    output::kv("Backups", &root.display().to_string());
    output::kv("Artifact", &settings.artifact.to_string());
    println!();

    let cycle = BackupCycle::new(
        settings,
        root,
        Arc::new(DirectoryHost::new(
            &args.server.server_dir,
            &args.server.world,
        )),
        Arc::new(NoSave),
    );

    let spinner = output::spinner("Copying world saves...");
    let result = cycle.create_backup().await;
    spinner.finish_and_clear();
    let report = result.context("Backup failed")?;

    output::success(&format!("Backup {} created", report.id));
    output::kv("Directory", &report.unit_dir.display().to_string());
    if let Some(archive) = &report.archive {
        output::kv(
            "Archive",
            &format!(
                "{} ({})",
                archive.archive_path.display(),
                output::format_bytes(archive.size_bytes)
            ),
        );
    }
    output::kv(
        "Files",
        &format!(
            "{} ({})",
            report.snapshot.total_files(),
            output::format_bytes(report.snapshot.bytes)
        ),
    );
    output::kv(
        "Players",
        &format!(
            "{} backed up, {} without a save for this world",
            report.snapshot.players, report.snapshot.players_skipped
        ),
    );
    if !report.pruned.is_empty() {
        output::kv("Pruned", &format!("{} expired backups", report.pruned.len()));
    }

    Ok(())
}
