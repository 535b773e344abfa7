//! VaultPort Shared Library
//!
//! This crate holds everything in the Bitwarden migration that does not talk
//! to the `bw` command line tool: the source data models, the folder tree
//! builder, the item normalizer and the encrypted vault store the items are
//! written into.
//!
//! # Features
//!
//! - **Source Models**: Serde models of `bw list folders` / `bw list items`
//! - **Folder Tree**: Rebuilds nested groups from `/`-delimited folder names
//! - **Normalizer**: Turns a Bitwarden item into an entry payload
//! - **Vault Store**: Groups and entries persisted as an AES-256 7z archive
//!
//! # Usage
//!
//! ```rust
//! use vaultport_shared::models::{Normalized, SourceItem};
//! use vaultport_shared::normalize::{normalize, ItemPolicy};
//! use vaultport_shared::store::{CompositeKey, MemoryFileProvider, VaultStore};
//!
//! let key = CompositeKey::from_parts("correct horse battery", None).unwrap();
//! let mut store = VaultStore::create_new(MemoryFileProvider::new(), "/vault.7z", key);
//! let root = store.root_group().clone();
//!
//! let item = SourceItem::login("id-1", "Mail", "alice", "hunter2");
//! if let Normalized::Entry(entry) = normalize(&item, ItemPolicy::default()) {
//!     store
//!         .add_entry(&root, &entry.title, &entry.username, &entry.password, None)
//!         .unwrap();
//! }
//! store.save().unwrap();
//! ```

pub mod folders;
pub mod models;
pub mod normalize;
pub mod store;
pub mod utils;

pub use folders::{build_groups, FolderMap, FolderTree, NodeId};
pub use models::{Normalized, NormalizedEntry, SkipReason, SourceFolder, SourceItem};
pub use normalize::{normalize, ItemPolicy};
pub use store::{
    CompositeKey, DesktopFileProvider, FileOperationProvider, MemoryFileProvider, StoreError,
    StoreResult, VaultStore,
};

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
