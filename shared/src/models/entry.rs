//! Normalized entry payload handed from the item normalizer to the driver

use serde::{Deserialize, Serialize};

/// A named property attached to an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryProperty {
    pub name: String,
    pub value: String,
    /// Protected in the destination store (masked, encrypted in memory)
    pub sensitive: bool,
}

impl EntryProperty {
    pub fn plain<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            sensitive: false,
        }
    }

    pub fn protected<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            sensitive: true,
        }
    }
}

/// An attachment to fetch from the source and attach to the entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: String,
    pub file_name: String,
}

/// Everything needed to write one destination entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedEntry {
    pub title: String,
    pub username: String,
    pub password: String,
    pub notes: Option<String>,
    pub url: Option<String>,
    pub properties: Vec<EntryProperty>,
    pub attachments: Vec<AttachmentRef>,
}

impl NormalizedEntry {
    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&EntryProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Why an item was not converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Card or identity item under the skip policy
    UnsupportedType(crate::models::ItemType),
    /// Item type this tool does not know
    UnknownType(u8),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnsupportedType(t) => write!(f, "{t} items are not converted"),
            SkipReason::UnknownType(n) => write!(f, "unknown item type {n}"),
        }
    }
}

/// Result of normalizing one source item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Entry(NormalizedEntry),
    Skip(SkipReason),
}
