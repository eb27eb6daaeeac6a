//! Configuration loading and management

mod loader;

pub use loader::{SettingsFile, SettingsLoader, SETTINGS_FILE_NAME};
