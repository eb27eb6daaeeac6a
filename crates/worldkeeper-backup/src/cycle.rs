//! Backup Cycle Coordinator.
//!
//! One cycle is: wait for the interval, trigger a world save, wait for it
//! to settle, snapshot, archive (when configured), log, prune. The first
//! failing step ends the cycle; its error is returned untouched. Host
//! queries and filesystem work run on the blocking pool.

use crate::archive::{ArchiveBuilder, ArchiveResult};
use crate::backup_id::BackupId;
use crate::error::{BackupError, Result};
use crate::host::{SaveTrigger, WorldHost};
use crate::layout;
use crate::retention::{BackupUnit, RetentionPruner};
use crate::snapshot::{SnapshotPlan, SnapshotStats};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use worldkeeper_core::BackupSettings;

/// Outcome of one successful cycle
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub id: BackupId,
    pub unit_dir: PathBuf,
    pub snapshot: SnapshotStats,
    /// Present when the artifact mode is `archive`
    pub archive: Option<ArchiveResult>,
    /// Units deleted by the retention pass
    pub pruned: Vec<BackupUnit>,
}

/// Runs backup cycles against one host and one backup root
pub struct BackupCycle {
    settings: BackupSettings,
    backup_root: PathBuf,
    host: Arc<dyn WorldHost>,
    save_trigger: Arc<dyn SaveTrigger>,
}

impl BackupCycle {
    pub fn new(
        settings: BackupSettings,
        backup_root: impl Into<PathBuf>,
        host: Arc<dyn WorldHost>,
        save_trigger: Arc<dyn SaveTrigger>,
    ) -> Self {
        Self {
            settings,
            backup_root: backup_root.into(),
            host,
            save_trigger,
        }
    }

    pub fn settings(&self) -> &BackupSettings {
        &self.settings
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Runs one full cycle including both waits and the save trigger
    pub async fn run_cycle(&self) -> Result<BackupReport> {
        let interval = self.settings.backup_interval();
        debug!("Next backup in {:?}", interval);
        tokio::time::sleep(interval).await;

        self.save_trigger.request_save();

        let settle = self.settings.pre_backup_save_wait();
        debug!("Waiting {:?} for the world save to settle", settle);
        tokio::time::sleep(settle).await;

        self.create_backup().await
    }

    /// Snapshot, archive, log and prune, without waiting or saving first
    pub async fn create_backup(&self) -> Result<BackupReport> {
        let id = BackupId::generate();
        let unit_dir = layout::unit_dir(&self.backup_root, id);
        let archive_path = self
            .settings
            .artifact
            .produces_archive()
            .then(|| layout::archive_path(&self.backup_root, id));

        let (snapshot, archive) = {
            let unit_dir = unit_dir.clone();
            let host = Arc::clone(&self.host);
            run_blocking(move || {
                let plan = SnapshotPlan::from_host(host.as_ref())?;
                let snapshot = plan.take(&unit_dir)?;
                let archive = archive_path
                    .map(|path| ArchiveBuilder::default().create(&unit_dir, &path))
                    .transpose()?;
                Ok((snapshot, archive))
            })
            .await?
        };

        info!("A new backup has been created. Backup ID: {}.", id);

        let pruner = RetentionPruner::from_settings(&self.backup_root, &self.settings);
        let pruned = run_blocking(move || pruner.prune(Utc::now())).await?;

        Ok(BackupReport {
            id,
            unit_dir,
            snapshot,
            archive,
            pruned,
        })
    }
}

/// Runs filesystem work on the blocking pool.
///
/// A panic inside `f` is resumed here with its original payload.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(BackupError::WorkerCancelled),
    }
}
