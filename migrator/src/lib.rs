//! VaultPort migrator
//!
//! Moves the contents of a Bitwarden vault, read through the `bw` command
//! line tool, into an encrypted vaultport archive. The binary in `main.rs`
//! wires configuration, logging and credentials around [`Migrator`].

pub mod config;
pub mod error;
pub mod migrate;
pub mod source;

pub use config::Config;
pub use error::{ConfigError, MigrateError, MigrateResult, SourceError, SourceResult};
pub use migrate::{MigrationOptions, MigrationReport, Migrator, RenamedEntry, SkippedItem};
pub use source::{BitwardenCli, VaultSource};
