//! Error types for the migrator
//!
//! Each layer has its own enum; [`MigrateError`] wraps the others so the
//! driver can attach a single reason to every skipped item.

use thiserror::Error;
use vaultport_shared::store::StoreError;

/// Main error type for a migration run
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Talking to the source vault failed
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The destination store rejected an operation
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Item refers to a folder that has no destination group
    #[error("No group for folder {folder_id}")]
    MissingFolder { folder_id: String },

    /// Every title candidate was already taken
    #[error("Title '{title}' still collides after {attempts} attempts")]
    TitleCollision { title: String, attempts: usize },
}

/// Errors from the `bw` command line tool
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Bitwarden CLI not found at {path}")]
    CliNotFound { path: String },

    #[error("Failed to run `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to parse output of `{command}`: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    #[error("Invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("Failed to read configuration file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Configuration parsing failed: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Result type for migration operations
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
