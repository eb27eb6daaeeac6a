//! Error types for worldkeeper-core

use thiserror::Error;

/// Result type alias using worldkeeper-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Worldkeeper
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration value or format
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Negative durations are rejected instead of producing degenerate timing
    #[error("{field} must not be negative, got {value}")]
    NegativeValue { field: &'static str, value: i64 },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a negative value error
    pub fn negative_value(field: &'static str, value: i64) -> Self {
        Self::NegativeValue { field, value }
    }

    /// Check if this error came from a rejected configuration value
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::NegativeValue { .. } | Self::YamlParse(_)
        )
    }
}
