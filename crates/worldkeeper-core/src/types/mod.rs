//! Type definitions for Worldkeeper configuration

pub(crate) mod backup_settings;

pub use backup_settings::{ArtifactMode, BackupSettings};
