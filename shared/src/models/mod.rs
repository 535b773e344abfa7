//! Data models for vaultport
//!
//! `source` mirrors the Bitwarden CLI records the migration reads;
//! `entry` is the normalized payload written to the vault store.

pub mod entry;
pub mod source;

pub use entry::*;
pub use source::*;
