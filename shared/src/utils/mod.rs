//! Utility modules for vaultport
//!
//! TOTP field parsing and the YAML/JSON helpers used by the vault archive.

pub mod totp;
pub mod yaml;

pub use totp::{parse_totp, TotpSettings, DEFAULT_TOTP_DIGITS, DEFAULT_TOTP_PERIOD};
pub use yaml::{deserialize_file_map, deserialize_record, serialize_file_map, serialize_record};
