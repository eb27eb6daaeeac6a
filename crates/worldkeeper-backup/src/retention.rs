//! Retention Pruner: deletes backup units older than the retention window.
//!
//! A unit is every artifact sharing one backup ID: the `<id>/` directory,
//! the `<id>.zip` archive, or both. An expired unit loses all of them.
//! Age comes from the timestamp encoded in the ID, and a unit is expired
//! once `now - created_at >= window`.

use crate::backup_id::BackupId;
use crate::error::{BackupError, Result};
use crate::layout::{has_extension, ARCHIVE_EXTENSION};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use worldkeeper_core::BackupSettings;

/// Artifacts of one backup on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupUnit {
    pub id: BackupId,
    /// `<root>/<id>/`, when present
    pub directory: Option<PathBuf>,
    /// `<root>/<id>.zip`, when present
    pub archive: Option<PathBuf>,
}

impl BackupUnit {
    fn new(id: BackupId) -> Self {
        Self {
            id,
            directory: None,
            archive: None,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.id.created_at()
    }

    /// Every path belonging to this unit
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        self.directory
            .as_deref()
            .into_iter()
            .chain(self.archive.as_deref())
    }
}

/// Lists backup units directly under `root`, oldest first.
///
/// Entries whose name is not a backup ID are ignored. A missing root has
/// no units.
pub fn list_units(root: &Path) -> Result<Vec<BackupUnit>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut units: BTreeMap<BackupId, BackupUnit> = BTreeMap::new();

    for entry in fs::read_dir(root).map_err(|e| BackupError::read_dir(root, e))? {
        let entry = entry.map_err(|e| BackupError::read_dir(root, e))?;
        let path = entry.path();

        if path.is_dir() {
            let id = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(BackupId::parse);
            if let Some(id) = id {
                units.entry(id).or_insert_with(|| BackupUnit::new(id)).directory = Some(path);
                continue;
            }
        } else if path.is_file() && has_extension(&path, ARCHIVE_EXTENSION) {
            let id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(BackupId::parse);
            if let Some(id) = id {
                units.entry(id).or_insert_with(|| BackupUnit::new(id)).archive = Some(path);
                continue;
            }
        }

        debug!("Ignoring {} in backup root", path.display());
    }

    Ok(units.into_values().collect())
}

/// Deletes expired backup units from a backup root
#[derive(Debug, Clone)]
pub struct RetentionPruner {
    root: PathBuf,
    window: Option<Duration>,
}

impl RetentionPruner {
    /// `window` of `None` keeps every backup
    pub fn new(root: impl Into<PathBuf>, window: Option<Duration>) -> Self {
        Self {
            root: root.into(),
            window,
        }
    }

    pub fn from_settings(root: impl Into<PathBuf>, settings: &BackupSettings) -> Self {
        Self::new(root, settings.retention_window())
    }

    pub fn window(&self) -> Option<Duration> {
        self.window
    }

    /// Whether `unit` is old enough to delete at `now`
    pub fn is_expired(&self, unit: &BackupUnit, now: DateTime<Utc>) -> bool {
        let Some(window) = self.window else {
            return false;
        };
        // A window too large for chrono never expires anything
        let Ok(window) = TimeDelta::from_std(window) else {
            return false;
        };
        now.signed_duration_since(unit.created_at()) >= window
    }

    /// Deletes every expired unit and returns what was deleted.
    ///
    /// The first deletion failure aborts pruning; units already deleted
    /// stay deleted.
    pub fn prune(&self, now: DateTime<Utc>) -> Result<Vec<BackupUnit>> {
        if self.window.is_none() {
            debug!("Retention disabled, keeping every backup");
            return Ok(Vec::new());
        }

        let mut removed = Vec::new();
        for unit in list_units(&self.root)? {
            if !self.is_expired(&unit, now) {
                continue;
            }

            if let Some(dir) = &unit.directory {
                fs::remove_dir_all(dir).map_err(|e| BackupError::remove(dir, e))?;
            }
            if let Some(archive) = &unit.archive {
                fs::remove_file(archive).map_err(|e| BackupError::remove(archive, e))?;
            }

            info!(
                "Removed backup {} created {}",
                unit.id,
                unit.created_at().format("%Y-%m-%d %H:%M:%S UTC")
            );
            removed.push(unit);
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    fn make_dir_unit(root: &Path, created: DateTime<Utc>) -> PathBuf {
        let dir = root.join(BackupId::from_datetime(created).to_string());
        fs::create_dir_all(dir.join("Level")).unwrap();
        fs::write(dir.join("Level/world.dat"), b"w").unwrap();
        dir
    }

    fn make_archive_unit(root: &Path, created: DateTime<Utc>) -> PathBuf {
        let path = root.join(format!("{}.zip", BackupId::from_datetime(created)));
        fs::write(&path, b"zip").unwrap();
        path
    }

    #[test]
    fn test_list_units_groups_and_sorts() {
        let temp = TempDir::new().unwrap();
        let now = Utc::now();
        let newer = make_dir_unit(temp.path(), now);
        let older = make_dir_unit(temp.path(), now - ChronoDuration::days(2));
        let older_zip = make_archive_unit(temp.path(), now - ChronoDuration::days(2));
        fs::create_dir_all(temp.path().join("manual-copy")).unwrap();
        fs::write(temp.path().join("notes.zip"), b"x").unwrap();
        fs::write(temp.path().join("123.txt"), b"x").unwrap();

        let units = list_units(temp.path()).unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].directory.as_ref(), Some(&older));
        assert_eq!(units[0].archive.as_ref(), Some(&older_zip));
        assert_eq!(units[1].directory.as_ref(), Some(&newer));
        assert_eq!(units[1].archive, None);
        assert_eq!(units[0].artifacts().count(), 2);
    }

    #[test]
    fn test_list_units_missing_root() {
        let temp = TempDir::new().unwrap();
        assert!(list_units(&temp.path().join("Backups")).unwrap().is_empty());
    }

    #[test]
    fn test_prune_deletes_units_past_window() {
        let temp = TempDir::new().unwrap();
        let now = Utc::now();
        let ten_days = make_dir_unit(temp.path(), now - ChronoDuration::days(10));
        let eight_days = make_dir_unit(temp.path(), now - ChronoDuration::days(8));
        let one_day = make_dir_unit(temp.path(), now - ChronoDuration::days(1));

        let pruner = RetentionPruner::new(temp.path(), Some(WEEK));
        let removed = pruner.prune(now).unwrap();

        assert_eq!(removed.len(), 2);
        assert!(!ten_days.exists());
        assert!(!eight_days.exists());
        assert!(one_day.exists());
    }

    #[test]
    fn test_prune_removes_archive_with_its_directory() {
        let temp = TempDir::new().unwrap();
        let now = Utc::now();
        let created = now - ChronoDuration::days(9);
        let dir = make_dir_unit(temp.path(), created);
        let zip = make_archive_unit(temp.path(), created);
        let orphan_zip = make_archive_unit(temp.path(), now - ChronoDuration::days(30));

        RetentionPruner::new(temp.path(), Some(WEEK))
            .prune(now)
            .unwrap();

        assert!(!dir.exists());
        assert!(!zip.exists());
        assert!(!orphan_zip.exists());
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let now = Utc::now();
        let pruner = RetentionPruner::new("/unused", Some(WEEK));

        let at_boundary = BackupUnit::new(BackupId::from_datetime(now - ChronoDuration::days(7)));
        let just_inside = BackupUnit::new(BackupId::from_datetime(
            now - ChronoDuration::days(7) + ChronoDuration::seconds(1),
        ));

        assert!(pruner.is_expired(&at_boundary, now));
        assert!(!pruner.is_expired(&just_inside, now));
    }

    #[test]
    fn test_zero_window_keeps_everything() {
        let temp = TempDir::new().unwrap();
        let now = Utc::now();
        let ancient = make_dir_unit(temp.path(), now - ChronoDuration::days(365));

        let settings = BackupSettings {
            remove_backups_older_than_days: 0,
            ..BackupSettings::default()
        };
        let removed = RetentionPruner::from_settings(temp.path(), &settings)
            .prune(now)
            .unwrap();

        assert!(removed.is_empty());
        assert!(ancient.exists());
    }

    #[test]
    fn test_non_backup_entries_survive_pruning() {
        let temp = TempDir::new().unwrap();
        let manual = temp.path().join("before-upgrade");
        fs::create_dir_all(&manual).unwrap();
        let by_year = temp.path().join("2024");
        fs::create_dir_all(&by_year).unwrap();
        fs::write(by_year.join("keep.txt"), b"operator copy").unwrap();
        fs::write(temp.path().join("2024.zip"), b"operator zip").unwrap();

        let removed = RetentionPruner::new(temp.path(), Some(WEEK))
            .prune(Utc::now())
            .unwrap();

        assert!(removed.is_empty());
        assert!(manual.exists());
        assert!(by_year.join("keep.txt").exists());
        assert!(temp.path().join("2024.zip").exists());
    }
}
