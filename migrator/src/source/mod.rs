//! Source vault access
//!
//! The migration reads everything through [`VaultSource`], so the driver can
//! run against the real `bw` tool or an in-memory fake.

pub mod bitwarden;

use vaultport_shared::models::{SourceFolder, SourceItem};

use crate::error::SourceResult;
pub use bitwarden::{resolve_bw_path, BitwardenCli, DEFAULT_BW_PATH};

/// Read access to a source vault. All calls block until complete.
pub trait VaultSource {
    /// All folders, including the root ("No Folder") record
    fn list_folders(&self) -> SourceResult<Vec<SourceFolder>>;

    /// All items, in the order the vault lists them
    fn list_items(&self) -> SourceResult<Vec<SourceItem>>;

    /// Raw bytes of one attachment
    fn attachment_bytes(&self, attachment_id: &str, item_id: &str) -> SourceResult<Vec<u8>>;
}
