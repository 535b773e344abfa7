//! Record types and archive layout of the vault store.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Extracted archive contents, path -> bytes
pub type FileMap = HashMap<String, Vec<u8>>;

pub const METADATA_FILE: &str = "metadata.yml";
pub const GROUPS_FILE: &str = "groups.yml";
pub const ENTRIES_DIR: &str = "entries";
pub const ENTRY_RECORD_FILE: &str = "record.yml";
pub const ATTACHMENTS_DIR: &str = "attachments";
pub const ATTACHMENT_EXTENSION: &str = "bin";

pub const CURRENT_VERSION: &str = "1.0";
pub const CURRENT_FORMAT: &str = "vaultport-v1";
pub const GENERATOR_NAME: &str = concat!("vaultport/", env!("CARGO_PKG_VERSION"));

/// Name of the group created with a new vault
pub const ROOT_GROUP_NAME: &str = "Root";

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of a group
    GroupId
);
record_id!(
    /// Identifier of an entry
    EntryId
);
record_id!(
    /// Content address of an attachment payload (SHA-256, hex)
    BinaryId
);

impl GroupId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl EntryId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Vault metadata stored in `metadata.yml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VaultMetadata {
    pub version: String,
    pub format: String,
    pub generator: String,
    pub created_at: i64,
    pub last_modified: i64,
    pub root_group: GroupId,
    pub group_count: usize,
    pub entry_count: usize,
    pub binary_count: usize,
}

impl VaultMetadata {
    pub fn new(root_group: GroupId) -> Self {
        let now = Utc::now().timestamp();
        Self {
            version: CURRENT_VERSION.to_string(),
            format: CURRENT_FORMAT.to_string(),
            generator: GENERATOR_NAME.to_string(),
            created_at: now,
            last_modified: now,
            root_group,
            group_count: 1,
            entry_count: 0,
            binary_count: 0,
        }
    }
}

/// A folder-like container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultGroup {
    pub id: GroupId,
    /// `None` only for the root group
    pub parent: Option<GroupId>,
    pub name: String,
    pub created_at: i64,
}

/// A named entry property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProperty {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub protected: bool,
}

/// Attachment reference on an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAttachment {
    pub binary: BinaryId,
    pub file_name: String,
}

/// A credential entry, stored as `entries/<id>/record.yml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    pub id: EntryId,
    pub group: GroupId,
    pub title: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub properties: Vec<StoredProperty>,
    #[serde(default)]
    pub attachments: Vec<StoredAttachment>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl VaultEntry {
    pub fn property(&self, name: &str) -> Option<&StoredProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Archive path of an entry record
pub fn entry_record_path(id: &EntryId) -> String {
    format!("{ENTRIES_DIR}/{id}/{ENTRY_RECORD_FILE}")
}

/// Archive path of an attachment payload
pub fn attachment_path(id: &BinaryId) -> String {
    format!("{ATTACHMENTS_DIR}/{id}.{ATTACHMENT_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_paths() {
        assert_eq!(entry_record_path(&EntryId::from("e1")), "entries/e1/record.yml");
        assert_eq!(attachment_path(&BinaryId::from("ab12")), "attachments/ab12.bin");
    }

    #[test]
    fn test_new_metadata() {
        let metadata = VaultMetadata::new(GroupId::from("root"));
        assert_eq!(metadata.format, CURRENT_FORMAT);
        assert_eq!(metadata.group_count, 1);
        assert_eq!(metadata.entry_count, 0);
        assert!(metadata.generator.starts_with("vaultport/"));
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let yaml = serde_yaml::to_string(&GroupId::from("g1")).unwrap();
        assert_eq!(yaml.trim(), "g1");
        assert_ne!(GroupId::generate(), GroupId::generate());
    }
}
