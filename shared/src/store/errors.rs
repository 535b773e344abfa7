//! Error types for the vault store.
//!
//! `FileError` covers archive I/O and encryption, `StoreError` everything
//! the store itself can reject.

use thiserror::Error;

/// File and archive operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("Creation failed: {message}")]
    CreationFailed { message: String },

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Corrupted archive: {message}")]
    CorruptedArchive { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// Vault store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Vault not found: {path}")]
    NotFound { path: String },

    #[error("Invalid credentials for vault {path}")]
    InvalidCredentials { path: String },

    #[error("Vault is corrupted: {message}")]
    Corrupted { message: String },

    #[error("Master password must not be empty")]
    EmptyPassword,

    #[error("Master password must be at least {min_length} characters")]
    WeakPassword { min_length: usize },

    #[error("Cannot read key file {path}: {message}")]
    KeyFile { path: String, message: String },

    #[error("Group not found: {id}")]
    GroupNotFound { id: String },

    #[error("Entry not found: {id}")]
    EntryNotFound { id: String },

    #[error("Binary not found: {id}")]
    BinaryNotFound { id: String },

    #[error("An entry titled '{title}' already exists in group {group}")]
    DuplicateTitle { group: String, title: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("File operation error: {0}")]
    File(#[from] FileError),
}

/// Result type for file operations
pub type FileResult<T> = Result<T, FileError>;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<std::io::Error> for FileError {
    fn from(err: std::io::Error) -> Self {
        FileError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(err: serde_yaml::Error) -> Self {
        StoreError::Serialization {
            message: err.to_string(),
        }
    }
}
