//! Backup settings controlling the scheduling loop and retention
//!
//! These values are read once at startup and passed by value into the
//! backup cycle; nothing mutates them afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// What a completed backup unit looks like on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactMode {
    /// The snapshot directory only
    Directory,
    /// The snapshot directory plus `<backup-id>.zip` next to it
    #[default]
    Archive,
}

impl ArtifactMode {
    /// Whether a zip archive is produced for every unit
    pub fn produces_archive(&self) -> bool {
        matches!(self, ArtifactMode::Archive)
    }
}

impl fmt::Display for ArtifactMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactMode::Directory => write!(f, "directory"),
            ArtifactMode::Archive => write!(f, "archive"),
        }
    }
}

impl FromStr for ArtifactMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "directory" | "dir" => Ok(ArtifactMode::Directory),
            "archive" | "zip" => Ok(ArtifactMode::Archive),
            other => Err(Error::invalid_config(format!(
                "Unknown artifact mode '{}'. Valid modes: directory, archive",
                other
            ))),
        }
    }
}

/// Validated backup settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BackupSettings {
    /// Minutes to wait before each backup cycle
    pub backup_interval_minutes: u64,

    /// Seconds to let the host finish its save before copying files
    pub pre_backup_save_wait_seconds: u64,

    /// Backups older than this many days are deleted (0 keeps everything)
    pub remove_backups_older_than_days: u64,

    /// Directory-only or directory plus zip archive
    pub artifact: ArtifactMode,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            backup_interval_minutes: default_backup_interval_minutes(),
            pre_backup_save_wait_seconds: default_pre_backup_save_wait_seconds(),
            remove_backups_older_than_days: default_remove_backups_older_than_days(),
            artifact: ArtifactMode::default(),
        }
    }
}

pub(crate) fn default_backup_interval_minutes() -> u64 {
    30
}
pub(crate) fn default_pre_backup_save_wait_seconds() -> u64 {
    5
}
pub(crate) fn default_remove_backups_older_than_days() -> u64 {
    7
}

impl BackupSettings {
    /// Build settings from raw signed values, rejecting negatives
    pub fn from_signed(
        backup_interval_minutes: i64,
        pre_backup_save_wait_seconds: i64,
        remove_backups_older_than_days: i64,
        artifact: ArtifactMode,
    ) -> Result<Self> {
        Ok(Self {
            backup_interval_minutes: non_negative(
                "backup-interval-minutes",
                backup_interval_minutes,
            )?,
            pre_backup_save_wait_seconds: non_negative(
                "pre-backup-save-wait-seconds",
                pre_backup_save_wait_seconds,
            )?,
            remove_backups_older_than_days: non_negative(
                "remove-backups-older-than-days",
                remove_backups_older_than_days,
            )?,
            artifact,
        })
    }

    /// Delay before each cycle triggers a save
    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_minutes.saturating_mul(60))
    }

    /// Grace period between the save trigger and the snapshot
    pub fn pre_backup_save_wait(&self) -> Duration {
        Duration::from_secs(self.pre_backup_save_wait_seconds)
    }

    /// Age past which a unit is pruned, `None` when pruning is disabled
    pub fn retention_window(&self) -> Option<Duration> {
        if self.remove_backups_older_than_days == 0 {
            None
        } else {
            Some(Duration::from_secs(
                self.remove_backups_older_than_days
                    .saturating_mul(SECONDS_PER_DAY),
            ))
        }
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::negative_value(field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = BackupSettings::default();
        assert_eq!(settings.backup_interval_minutes, 30);
        assert_eq!(settings.pre_backup_save_wait_seconds, 5);
        assert_eq!(settings.remove_backups_older_than_days, 7);
        assert_eq!(settings.artifact, ArtifactMode::Archive);
    }

    #[test]
    fn test_durations() {
        let settings = BackupSettings::default();
        assert_eq!(settings.backup_interval(), Duration::from_secs(30 * 60));
        assert_eq!(settings.pre_backup_save_wait(), Duration::from_secs(5));
        assert_eq!(
            settings.retention_window(),
            Some(Duration::from_secs(7 * 24 * 60 * 60))
        );
    }

    #[test]
    fn test_zero_retention_disables_pruning() {
        let settings = BackupSettings {
            remove_backups_older_than_days: 0,
            ..BackupSettings::default()
        };
        assert_eq!(settings.retention_window(), None);
    }

    #[test]
    fn test_from_signed_rejects_negatives() {
        let err = BackupSettings::from_signed(-1, 5, 7, ArtifactMode::Archive).unwrap_err();
        assert!(matches!(
            err,
            Error::NegativeValue {
                field: "backup-interval-minutes",
                value: -1
            }
        ));

        let err = BackupSettings::from_signed(30, 5, -7, ArtifactMode::Archive).unwrap_err();
        assert!(matches!(
            err,
            Error::NegativeValue {
                field: "remove-backups-older-than-days",
                ..
            }
        ));
    }

    #[test]
    fn test_from_signed_accepts_zero() {
        let settings = BackupSettings::from_signed(0, 0, 0, ArtifactMode::Directory).unwrap();
        assert_eq!(settings.backup_interval(), Duration::ZERO);
        assert_eq!(settings.pre_backup_save_wait(), Duration::ZERO);
    }

    #[test]
    fn test_artifact_mode_parsing() {
        assert_eq!(
            "directory".parse::<ArtifactMode>().unwrap(),
            ArtifactMode::Directory
        );
        assert_eq!("ZIP".parse::<ArtifactMode>().unwrap(), ArtifactMode::Archive);
        assert!("tarball".parse::<ArtifactMode>().is_err());
        assert_eq!(ArtifactMode::Directory.to_string(), "directory");
    }
}
