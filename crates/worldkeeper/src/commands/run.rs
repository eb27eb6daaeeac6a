//! Run command: hosts the backup worker for a server directory
//!
//! The command plays the game server's part: its main loop drains the
//! main-thread queue (where world saves run), starts the worker once the
//! world directory exists, and turns Ctrl-C into a cooperative stop.

use anyhow::{Context, Result};
use clap::Args;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use worldkeeper_backup::{
    backup_root, main_thread_channel, BackupCycle, BackupWorker, DirectoryHost, QueuedSave,
    WorldHost,
};
use worldkeeper_core::SettingsLoader;

use crate::cli::{DataDirArgs, ServerArgs, SettingsOverrides};
use crate::output;

/// How often the main loop drains queued main-thread work
const MAIN_LOOP_TICK: Duration = Duration::from_millis(100);

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub data: DataDirArgs,

    /// Shell command that makes the server save the world
    #[arg(long)]
    pub save_command: Option<String>,

    #[command(flatten)]
    pub overrides: SettingsOverrides,
}

pub async fn run(args: RunArgs, loader: &SettingsLoader) -> Result<()> {
    let settings = args.overrides.apply(
        loader
            .load()
            .with_context(|| format!("Failed to load settings from {}", loader.config_dir()))?,
    )?;

    let host = DirectoryHost::new(&args.server.server_dir, &args.server.world);
    let world_dir = host.world_save_directory();
    let root = backup_root(&args.data.data_dir);

    output::header("Worldkeeper");
    output::kv("World", &args.server.world);
    output::kv("Server", args.server.server_dir.as_str());
    output::kv("Backups", &root.display().to_string());
    output::kv(
        "Interval",
        &format!("{} min", settings.backup_interval_minutes),
    );
    output::kv(
        "Save wait",
        &format!("{} s", settings.pre_backup_save_wait_seconds),
    );
    output::kv(
        "Retention",
        &match settings.remove_backups_older_than_days {
            0 => "keep everything".to_string(),
            days => format!("{} days", days),
        },
    );
    output::kv("Artifact", &settings.artifact.to_string());
    println!();

    let (dispatcher, mut queue) = main_thread_channel();
    let save = QueuedSave::new(dispatcher, save_routine(args.save_command));
    let worker = BackupWorker::new(BackupCycle::new(
        settings,
        root,
        Arc::new(host),
        Arc::new(save),
    ));

    let mut world_ready = worker.on_load(world_dir.is_dir());
    if !world_ready {
        output::info(&format!(
            "Waiting for world directory {}",
            world_dir.display()
        ));
    }

    let mut tick = tokio::time::interval(MAIN_LOOP_TICK);
    let mut stopping = false;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                queue.run_pending();

                if !world_ready && world_dir.is_dir() {
                    info!("World directory found, starting backups");
                    world_ready = worker.on_world_ready();
                }
                if world_ready && !worker.is_running() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if stopping {
                    output::warning("Interrupted again, exiting without waiting");
                    std::process::exit(130);
                }
                stopping = true;
                worker.on_unload();
                if !world_ready {
                    break;
                }
                output::info("Stopping after the current backup (Ctrl-C again to exit now)");
            }
        }
    }

    // Saves queued by the final cycle still belong to the main thread
    queue.run_pending();

    if let Err(e) = worker.join().await {
        output::error(&format!("Backup worker failed: {}", e));
        return Err(e).context("Backup worker stopped on an error");
    }

    output::success("Backup worker stopped");
    Ok(())
}

/// World save routine run on the main loop
fn save_routine(save_command: Option<String>) -> impl Fn() + Send + Sync + 'static {
    move || match &save_command {
        Some(command) => match Command::new("sh").arg("-c").arg(command).status() {
            Ok(status) if status.success() => info!("World saved"),
            Ok(status) => warn!("Save command exited with {}", status),
            Err(e) => warn!("Failed to run save command: {}", e),
        },
        None => info!("World save requested"),
    }
}
