//! Error types for the billing CLI.

use std::path::PathBuf;

use billing_core::{BillingError, ConfigError, DocumentValidationError, TotalMismatch};

/// CLI errors.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("No config directory available on this platform")]
    NoConfigDir,

    #[error(transparent)]
    Billing(#[from] BillingError),
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        CliError::Billing(error.into())
    }
}

impl From<DocumentValidationError> for CliError {
    fn from(error: DocumentValidationError) -> Self {
        CliError::Billing(error.into())
    }
}

impl From<TotalMismatch> for CliError {
    fn from(error: TotalMismatch) -> Self {
        CliError::Billing(error.into())
    }
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
