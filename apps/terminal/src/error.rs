//! Terminal configuration errors.

use std::path::PathBuf;

use thiserror::Error;
use tillpoint_core::ValidationError;
use tillpoint_inventory::InventoryError;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors loading, validating or saving `terminal.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file exists but could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this layout.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Config could not be written.
    #[error("Failed to save config to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither `--config` nor a platform config directory is available.
    #[error("No config path available")]
    NoPath,

    /// Store id failed validation.
    #[error("Invalid store: {0}")]
    Store(#[from] ValidationError),

    /// `[api]` or `[cache]` failed validation.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// `[scanner]` failed validation.
    #[error("Invalid scanner configuration: {0}")]
    Scanner(String),
}
