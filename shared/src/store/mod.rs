//! Destination vault store
//!
//! A vault is a tree of groups holding credential entries, persisted as an
//! AES-256 encrypted 7z archive:
//!
//! ```text
//! metadata.yml                 VaultMetadata
//! groups.yml                   ordered list of VaultGroup
//! entries/<entry-id>/record.yml
//! attachments/<binary-id>.bin
//! ```
//!
//! The whole vault lives in memory while open. Nothing touches the archive
//! until [`VaultStore::save`] is called.

pub mod errors;
pub mod file_provider;
pub mod key;
pub mod types;

use std::collections::HashMap;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

pub use errors::{FileError, FileResult, StoreError, StoreResult};
pub use file_provider::{DesktopFileProvider, FileOperationProvider, MemoryFileProvider};
pub use key::CompositeKey;
pub use types::{
    BinaryId, EntryId, FileMap, GroupId, StoredAttachment, StoredProperty, VaultEntry, VaultGroup,
    VaultMetadata,
};

use crate::utils::yaml::{deserialize_record, serialize_record};
use types::{
    attachment_path, entry_record_path, ATTACHMENTS_DIR, ATTACHMENT_EXTENSION, CURRENT_FORMAT,
    ENTRIES_DIR, ENTRY_RECORD_FILE, GROUPS_FILE, METADATA_FILE, ROOT_GROUP_NAME,
};

/// An open vault
pub struct VaultStore<F: FileOperationProvider> {
    provider: F,
    path: String,
    key: CompositeKey,
    metadata: VaultMetadata,
    groups: Vec<VaultGroup>,
    entries: Vec<VaultEntry>,
    binaries: HashMap<BinaryId, Vec<u8>>,
    modified: bool,
}

impl<F: FileOperationProvider> VaultStore<F> {
    /// Open an existing vault.
    ///
    /// # Returns
    /// * `Err(StoreError::NotFound)` - If there is no archive at `path`
    /// * `Err(StoreError::InvalidCredentials)` - If the key does not decrypt it
    /// * `Err(StoreError::Corrupted)` - If its contents do not form a valid vault
    pub fn open(provider: F, path: &str, key: CompositeKey) -> StoreResult<Self> {
        let data = provider.read_archive(path).map_err(|e| match e {
            FileError::NotFound { .. } => StoreError::NotFound {
                path: path.to_string(),
            },
            other => StoreError::File(other),
        })?;

        let files = provider
            .extract_archive(&data, key.archive_password())
            .map_err(|e| match e {
                FileError::InvalidPassword => StoreError::InvalidCredentials {
                    path: path.to_string(),
                },
                FileError::CorruptedArchive { message } => StoreError::Corrupted { message },
                other => StoreError::File(other),
            })?;

        let store = Self::from_file_map(provider, path, key, files)?;

        info!(
            "Opened vault {} ({} groups, {} entries)",
            path,
            store.groups.len(),
            store.entries.len()
        );
        Ok(store)
    }

    /// Create an empty vault holding only a root group.
    ///
    /// Nothing is written until [`save`](Self::save).
    pub fn create_new(provider: F, path: &str, key: CompositeKey) -> Self {
        let now = Utc::now().timestamp();
        let root = VaultGroup {
            id: GroupId::generate(),
            parent: None,
            name: ROOT_GROUP_NAME.to_string(),
            created_at: now,
        };

        debug!("Creating new vault at {}", path);
        Self {
            provider,
            path: path.to_string(),
            key,
            metadata: VaultMetadata::new(root.id.clone()),
            groups: vec![root],
            entries: Vec::new(),
            binaries: HashMap::new(),
            modified: true,
        }
    }

    /// Open the vault at `path`, or create a new one when none exists.
    ///
    /// The flag is `true` when a new vault was created.
    pub fn open_or_create(
        provider: F,
        path: &str,
        key: CompositeKey,
    ) -> StoreResult<(Self, bool)> {
        match provider.read_archive(path) {
            Err(FileError::NotFound { .. }) => {
                info!("No vault at {}, creating a new one", path);
                Ok((Self::create_new(provider, path, key), true))
            }
            _ => Ok((Self::open(provider, path, key)?, false)),
        }
    }

    /// Encrypt and write the vault to its path
    pub fn save(&mut self) -> StoreResult<()> {
        self.metadata.last_modified = Utc::now().timestamp();
        self.metadata.group_count = self.groups.len();
        self.metadata.entry_count = self.entries.len();
        self.metadata.binary_count = self.binaries.len();

        let files = self.to_file_map()?;
        let archive = self
            .provider
            .create_archive(files, self.key.archive_password())?;
        self.provider.write_archive(&self.path, &archive)?;

        self.modified = false;
        info!(
            "Saved vault {} ({} groups, {} entries, {} attachments)",
            self.path,
            self.groups.len(),
            self.entries.len(),
            self.binaries.len()
        );
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn metadata(&self) -> &VaultMetadata {
        &self.metadata
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn root_group(&self) -> &GroupId {
        &self.metadata.root_group
    }

    /// Add a group under `parent`. Sibling groups may share a name.
    pub fn add_group(&mut self, parent: &GroupId, name: &str) -> StoreResult<GroupId> {
        self.require_group(parent)?;

        let group = VaultGroup {
            id: GroupId::generate(),
            parent: Some(parent.clone()),
            name: name.to_string(),
            created_at: Utc::now().timestamp(),
        };
        let id = group.id.clone();
        self.groups.push(group);
        self.modified = true;

        debug!("Added group '{}' ({})", name, id);
        Ok(id)
    }

    /// Add an entry to `group`.
    ///
    /// Fails with [`StoreError::DuplicateTitle`] if the group already holds
    /// an entry with the same title.
    pub fn add_entry(
        &mut self,
        group: &GroupId,
        title: &str,
        username: &str,
        password: &str,
        notes: Option<&str>,
    ) -> StoreResult<EntryId> {
        self.require_group(group)?;

        if self
            .entries
            .iter()
            .any(|e| &e.group == group && e.title == title)
        {
            return Err(StoreError::DuplicateTitle {
                group: group.to_string(),
                title: title.to_string(),
            });
        }

        let now = Utc::now().timestamp();
        let entry = VaultEntry {
            id: EntryId::generate(),
            group: group.clone(),
            title: title.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            notes: notes.map(str::to_string),
            url: None,
            properties: Vec::new(),
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let id = entry.id.clone();
        self.entries.push(entry);
        self.modified = true;

        Ok(id)
    }

    /// Set a named property, replacing any existing one of the same name
    pub fn set_custom_property(
        &mut self,
        entry: &EntryId,
        name: &str,
        value: &str,
        protected: bool,
    ) -> StoreResult<()> {
        let record = self.entry_mut(entry)?;
        let property = StoredProperty {
            name: name.to_string(),
            value: value.to_string(),
            protected,
        };

        match record.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = property,
            None => record.properties.push(property),
        }
        Ok(())
    }

    pub fn set_url(&mut self, entry: &EntryId, url: &str) -> StoreResult<()> {
        self.entry_mut(entry)?.url = Some(url.to_string());
        Ok(())
    }

    /// Store an attachment payload. Identical payloads share one binary.
    pub fn add_binary(&mut self, data: Vec<u8>) -> BinaryId {
        let id = BinaryId::from(format!("{:x}", Sha256::digest(&data)));
        if !self.binaries.contains_key(&id) {
            self.binaries.insert(id.clone(), data);
            self.modified = true;
        }
        id
    }

    /// Attach a stored binary to an entry under `file_name`
    pub fn add_attachment(
        &mut self,
        entry: &EntryId,
        binary: &BinaryId,
        file_name: &str,
    ) -> StoreResult<()> {
        if !self.binaries.contains_key(binary) {
            return Err(StoreError::BinaryNotFound {
                id: binary.to_string(),
            });
        }

        self.entry_mut(entry)?.attachments.push(StoredAttachment {
            binary: binary.clone(),
            file_name: file_name.to_string(),
        });
        Ok(())
    }

    /// Remove an entry, dropping binaries no other entry references
    pub fn remove_entry(&mut self, entry: &EntryId) -> StoreResult<VaultEntry> {
        let position = self
            .entries
            .iter()
            .position(|e| &e.id == entry)
            .ok_or_else(|| StoreError::EntryNotFound {
                id: entry.to_string(),
            })?;
        let removed = self.entries.remove(position);

        for attachment in &removed.attachments {
            let still_used = self
                .entries
                .iter()
                .flat_map(|e| e.attachments.iter())
                .any(|a| a.binary == attachment.binary);
            if !still_used {
                self.binaries.remove(&attachment.binary);
            }
        }

        self.modified = true;
        debug!("Removed entry '{}' ({})", removed.title, removed.id);
        Ok(removed)
    }

    /// All groups, root first, in creation order
    pub fn groups(&self) -> &[VaultGroup] {
        &self.groups
    }

    pub fn group(&self, id: &GroupId) -> Option<&VaultGroup> {
        self.groups.iter().find(|g| &g.id == id)
    }

    /// Direct child groups of `id`, in creation order
    pub fn children(&self, id: &GroupId) -> Vec<&VaultGroup> {
        self.groups
            .iter()
            .filter(|g| g.parent.as_ref() == Some(id))
            .collect()
    }

    pub fn entries(&self) -> &[VaultEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &EntryId) -> Option<&VaultEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn entries_in(&self, group: &GroupId) -> Vec<&VaultEntry> {
        self.entries.iter().filter(|e| &e.group == group).collect()
    }

    pub fn binary(&self, id: &BinaryId) -> Option<&[u8]> {
        self.binaries.get(id).map(Vec::as_slice)
    }

    /// Group names from below the root down to `id`
    pub fn group_path(&self, id: &GroupId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut cursor = self.group(id);
        while let Some(group) = cursor {
            if group.parent.is_none() {
                break;
            }
            path.push(group.name.as_str());
            cursor = group.parent.as_ref().and_then(|p| self.group(p));
        }
        path.reverse();
        path
    }

    fn require_group(&self, id: &GroupId) -> StoreResult<()> {
        match self.group(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::GroupNotFound { id: id.to_string() }),
        }
    }

    fn entry_mut(&mut self, id: &EntryId) -> StoreResult<&mut VaultEntry> {
        self.modified = true;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| StoreError::EntryNotFound { id: id.to_string() })?;
        entry.updated_at = Utc::now().timestamp();
        Ok(entry)
    }

    fn to_file_map(&self) -> StoreResult<FileMap> {
        let mut files = FileMap::new();
        files.insert(
            METADATA_FILE.to_string(),
            serialize_record("metadata", &self.metadata)?,
        );
        files.insert(
            GROUPS_FILE.to_string(),
            serialize_record("groups", &self.groups)?,
        );
        for entry in &self.entries {
            files.insert(
                entry_record_path(&entry.id),
                serialize_record("entry", entry)?,
            );
        }
        for (id, data) in &self.binaries {
            files.insert(attachment_path(id), data.clone());
        }
        Ok(files)
    }

    fn from_file_map(
        provider: F,
        path: &str,
        key: CompositeKey,
        mut files: FileMap,
    ) -> StoreResult<Self> {
        let metadata: VaultMetadata = deserialize_record(
            "metadata",
            &files.remove(METADATA_FILE).ok_or_else(|| corrupted("metadata.yml is missing"))?,
        )
        .map_err(as_corruption)?;

        if metadata.format != CURRENT_FORMAT {
            return Err(corrupted(format!("unsupported vault format '{}'", metadata.format)));
        }

        let groups: Vec<VaultGroup> = deserialize_record(
            "groups",
            &files.remove(GROUPS_FILE).ok_or_else(|| corrupted("groups.yml is missing"))?,
        )
        .map_err(as_corruption)?;

        let mut entries = Vec::new();
        let mut binaries = HashMap::new();
        for (file_path, data) in files {
            match file_path.split('/').collect::<Vec<_>>().as_slice() {
                [ENTRIES_DIR, _, ENTRY_RECORD_FILE] => {
                    let entry: VaultEntry =
                        deserialize_record("entry", &data).map_err(as_corruption)?;
                    entries.push(entry);
                }
                [ATTACHMENTS_DIR, file_name] => {
                    let id = file_name
                        .strip_suffix(ATTACHMENT_EXTENSION)
                        .and_then(|s| s.strip_suffix('.'))
                        .ok_or_else(|| corrupted(format!("unexpected attachment file {file_path}")))?;
                    binaries.insert(BinaryId::from(id), data);
                }
                _ => debug!("Ignoring unknown archive member {}", file_path),
            }
        }
        // Record files carry no order of their own
        entries.sort_by(|a: &VaultEntry, b: &VaultEntry| {
            (a.created_at, &a.id).cmp(&(b.created_at, &b.id))
        });

        let store = Self {
            provider,
            path: path.to_string(),
            key,
            metadata,
            groups,
            entries,
            binaries,
            modified: false,
        };
        store.validate()?;
        Ok(store)
    }

    /// Check the loaded structure against itself and the metadata counts
    fn validate(&self) -> StoreResult<()> {
        let root = self
            .group(&self.metadata.root_group)
            .ok_or_else(|| corrupted("root group is missing"))?;
        if root.parent.is_some() {
            return Err(corrupted("root group has a parent"));
        }

        for group in &self.groups {
            if let Some(parent) = &group.parent {
                if self.group(parent).is_none() {
                    return Err(corrupted(format!(
                        "group {} refers to missing parent {}",
                        group.id, parent
                    )));
                }
            } else if group.id != self.metadata.root_group {
                return Err(corrupted(format!("group {} has no parent", group.id)));
            }
        }

        for entry in &self.entries {
            if self.group(&entry.group).is_none() {
                return Err(corrupted(format!(
                    "entry {} refers to missing group {}",
                    entry.id, entry.group
                )));
            }
            if let Some(missing) = entry
                .attachments
                .iter()
                .find(|a| !self.binaries.contains_key(&a.binary))
            {
                return Err(corrupted(format!(
                    "entry {} refers to missing attachment {}",
                    entry.id, missing.binary
                )));
            }
        }

        let counts = (self.groups.len(), self.entries.len(), self.binaries.len());
        let expected = (
            self.metadata.group_count,
            self.metadata.entry_count,
            self.metadata.binary_count,
        );
        if counts != expected {
            return Err(corrupted(format!(
                "metadata expects {expected:?} groups/entries/binaries, archive holds {counts:?}"
            )));
        }

        Ok(())
    }
}

impl<F: FileOperationProvider> std::fmt::Debug for VaultStore<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultStore")
            .field("path", &self.path)
            .field("groups", &self.groups.len())
            .field("entries", &self.entries.len())
            .field("binaries", &self.binaries.len())
            .field("modified", &self.modified)
            .finish()
    }
}

fn corrupted<S: Into<String>>(message: S) -> StoreError {
    StoreError::Corrupted {
        message: message.into(),
    }
}

fn as_corruption(err: StoreError) -> StoreError {
    match err {
        StoreError::Serialization { message } => StoreError::Corrupted { message },
        other => other,
    }
}
