//! Settings loader with precedence
//!
//! Loads backup settings from the following sources (low to high):
//! 1. Built-in defaults
//! 2. Settings file (`<config-dir>/worldkeeper.yaml`)
//! 3. Environment variables (WORLDKEEPER_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::backup_settings::{
    default_backup_interval_minutes, default_pre_backup_save_wait_seconds,
    default_remove_backups_older_than_days,
};
use crate::types::{ArtifactMode, BackupSettings};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use tracing::debug;

/// Settings file name inside the config directory
pub const SETTINGS_FILE_NAME: &str = "worldkeeper.yaml";

/// On-disk settings layer
///
/// Values stay signed so that negative numbers reach validation instead of
/// failing as opaque parse errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_interval_minutes: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_backup_save_wait_seconds: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_backups_older_than_days: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactMode>,
}

impl SettingsFile {
    /// Layer `overlay` on top of `self`, overlay values win
    fn merge(self, overlay: SettingsFile) -> SettingsFile {
        SettingsFile {
            backup_interval_minutes: overlay
                .backup_interval_minutes
                .or(self.backup_interval_minutes),
            pre_backup_save_wait_seconds: overlay
                .pre_backup_save_wait_seconds
                .or(self.pre_backup_save_wait_seconds),
            remove_backups_older_than_days: overlay
                .remove_backups_older_than_days
                .or(self.remove_backups_older_than_days),
            artifact: overlay.artifact.or(self.artifact),
        }
    }

    /// Fill gaps with defaults and validate
    pub fn resolve(self) -> Result<BackupSettings> {
        BackupSettings::from_signed(
            self.backup_interval_minutes
                .unwrap_or(default_backup_interval_minutes() as i64),
            self.pre_backup_save_wait_seconds
                .unwrap_or(default_pre_backup_save_wait_seconds() as i64),
            self.remove_backups_older_than_days
                .unwrap_or(default_remove_backups_older_than_days() as i64),
            self.artifact.unwrap_or_default(),
        )
    }
}

/// Loads backup settings from a config directory
pub struct SettingsLoader {
    /// Directory holding worldkeeper.yaml
    config_dir: Utf8PathBuf,
}

impl SettingsLoader {
    /// Create a loader for the given config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Path of the settings file
    pub fn settings_path(&self) -> Utf8PathBuf {
        self.config_dir.join(SETTINGS_FILE_NAME)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Load settings with defaults, file and environment layered in order
    pub fn load(&self) -> Result<BackupSettings> {
        let mut layered = SettingsFile::default();

        let path = self.settings_path();
        if path.exists() {
            debug!("Loading settings from {}", path);
            layered = layered.merge(Self::load_yaml_file(&path)?);
        } else {
            debug!("No settings file at {}, using defaults", path);
        }

        layered = layered.merge(Self::env_overrides()?);
        layered.resolve()
    }

    /// Write the default settings file, returning its path
    pub fn write_defaults(&self, overwrite: bool) -> Result<Utf8PathBuf> {
        let path = self.settings_path();
        if path.exists() && !overwrite {
            return Err(Error::invalid_config(format!(
                "Settings file already exists: {}",
                path
            )));
        }

        fs::create_dir_all(&self.config_dir)?;
        let content = serde_yaml_ng::to_string(&BackupSettings::default())?;
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Load a YAML settings file
    fn load_yaml_file(path: &Utf8Path) -> Result<SettingsFile> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(SettingsFile::default());
        }
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Collect WORLDKEEPER_* environment overrides
    fn env_overrides() -> Result<SettingsFile> {
        let mut overlay = SettingsFile::default();

        if let Ok(val) = env::var("WORLDKEEPER_BACKUP_INTERVAL_MINUTES") {
            overlay.backup_interval_minutes = Some(val.trim().parse().map_err(|_| {
                Error::invalid_config("WORLDKEEPER_BACKUP_INTERVAL_MINUTES must be a valid number")
            })?);
        }

        if let Ok(val) = env::var("WORLDKEEPER_PRE_BACKUP_SAVE_WAIT_SECONDS") {
            overlay.pre_backup_save_wait_seconds = Some(val.trim().parse().map_err(|_| {
                Error::invalid_config(
                    "WORLDKEEPER_PRE_BACKUP_SAVE_WAIT_SECONDS must be a valid number",
                )
            })?);
        }

        if let Ok(val) = env::var("WORLDKEEPER_REMOVE_BACKUPS_OLDER_THAN_DAYS") {
            overlay.remove_backups_older_than_days = Some(val.trim().parse().map_err(|_| {
                Error::invalid_config(
                    "WORLDKEEPER_REMOVE_BACKUPS_OLDER_THAN_DAYS must be a valid number",
                )
            })?);
        }

        if let Ok(val) = env::var("WORLDKEEPER_ARTIFACT") {
            overlay.artifact = Some(val.parse()?);
        }

        Ok(overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn create_temp_loader() -> (SettingsLoader, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_dir =
            Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).expect("Invalid UTF-8 path");
        (SettingsLoader::with_dir(config_dir), temp_dir)
    }

    #[test]
    #[serial]
    fn test_load_defaults_without_file() {
        let (loader, _temp) = create_temp_loader();
        let settings = loader.load().unwrap();
        assert_eq!(settings, BackupSettings::default());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let (loader, _temp) = create_temp_loader();

        let content = r#"
backup-interval-minutes: 15
pre-backup-save-wait-seconds: 10
remove-backups-older-than-days: 3
artifact: directory
"#;
        fs::write(loader.settings_path(), content).unwrap();

        let settings = loader.load().unwrap();
        assert_eq!(settings.backup_interval_minutes, 15);
        assert_eq!(settings.pre_backup_save_wait_seconds, 10);
        assert_eq!(settings.remove_backups_older_than_days, 3);
        assert_eq!(settings.artifact, ArtifactMode::Directory);
    }

    #[test]
    #[serial]
    fn test_partial_file_keeps_defaults() {
        let (loader, _temp) = create_temp_loader();
        fs::write(loader.settings_path(), "backup-interval-minutes: 60\n").unwrap();

        let settings = loader.load().unwrap();
        assert_eq!(settings.backup_interval_minutes, 60);
        assert_eq!(settings.pre_backup_save_wait_seconds, 5);
        assert_eq!(settings.remove_backups_older_than_days, 7);
    }

    #[test]
    #[serial]
    fn test_negative_value_in_file_rejected() {
        let (loader, _temp) = create_temp_loader();
        fs::write(loader.settings_path(), "pre-backup-save-wait-seconds: -3\n").unwrap();

        let err = loader.load().unwrap_err();
        assert!(matches!(
            err,
            Error::NegativeValue {
                field: "pre-backup-save-wait-seconds",
                value: -3
            }
        ));
    }

    #[test]
    #[serial]
    fn test_malformed_file_rejected() {
        let (loader, _temp) = create_temp_loader();
        fs::write(loader.settings_path(), "backup-interval-minutes: [1, 2]\n").unwrap();

        let err = loader.load().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let (loader, _temp) = create_temp_loader();
        fs::write(loader.settings_path(), "backup-interval-minutes: 15\n").unwrap();

        env::set_var("WORLDKEEPER_BACKUP_INTERVAL_MINUTES", "45");
        env::set_var("WORLDKEEPER_ARTIFACT", "directory");

        let settings = loader.load().unwrap();
        assert_eq!(settings.backup_interval_minutes, 45);
        assert_eq!(settings.artifact, ArtifactMode::Directory);

        env::remove_var("WORLDKEEPER_BACKUP_INTERVAL_MINUTES");
        env::remove_var("WORLDKEEPER_ARTIFACT");
    }

    #[test]
    #[serial]
    fn test_invalid_env_override() {
        let (loader, _temp) = create_temp_loader();

        env::set_var("WORLDKEEPER_REMOVE_BACKUPS_OLDER_THAN_DAYS", "a week");
        let result = loader.load();
        env::remove_var("WORLDKEEPER_REMOVE_BACKUPS_OLDER_THAN_DAYS");

        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    #[serial]
    fn test_write_defaults_round_trips() {
        let (loader, _temp) = create_temp_loader();

        let path = loader.write_defaults(false).unwrap();
        assert!(path.exists());
        assert_eq!(loader.load().unwrap(), BackupSettings::default());

        // Refuses to clobber an existing file unless asked to
        assert!(loader.write_defaults(false).is_err());
        assert!(loader.write_defaults(true).is_ok());
    }
}
