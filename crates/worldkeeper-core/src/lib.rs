//! # worldkeeper-core
//!
//! Core library for Worldkeeper providing:
//! - Backup settings (interval, pre-backup save wait, retention window, artifact kind)
//! - Configuration loading (worldkeeper.yaml) with environment overrides
//! - The shared configuration error type

pub mod config;
pub mod error;
pub mod types;

pub use config::SettingsLoader;
pub use error::{Error, Result};
pub use types::{ArtifactMode, BackupSettings};
