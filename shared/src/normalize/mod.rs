//! Item normalizer
//!
//! Converts one Bitwarden item into the payload the driver writes into the
//! vault store. The conversion is pure: no attachment bytes are fetched and
//! nothing is written here.
//!
//! Properties are emitted in a fixed order: TOTP seed and settings, URL
//! derived properties in URI order, card or identity attributes (flatten
//! policy only), then custom fields in source order.

pub mod urls;

use serde::{Deserialize, Serialize};

use crate::models::{
    AttachmentRef, EntryProperty, ItemType, Normalized, NormalizedEntry, SkipReason, SourceItem,
};
use crate::utils::totp::parse_totp;
pub use urls::{classify_uris, UrlAssignment};

/// Property holding the TOTP shared secret
pub const TOTP_SEED_PROPERTY: &str = "TOTP Seed";

/// Property holding `"{period};{digits}"`
pub const TOTP_SETTINGS_PROPERTY: &str = "TOTP Settings";

/// How card and identity items are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemPolicy {
    /// Leave card and identity items out of the migration
    #[default]
    Skip,
    /// Convert them, storing every attribute as a property
    Flatten,
}

impl std::str::FromStr for ItemPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(ItemPolicy::Skip),
            "flatten" => Ok(ItemPolicy::Flatten),
            other => Err(format!("unknown item policy '{other}' (expected skip or flatten)")),
        }
    }
}

impl std::fmt::Display for ItemPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemPolicy::Skip => write!(f, "skip"),
            ItemPolicy::Flatten => write!(f, "flatten"),
        }
    }
}

/// Normalize a source item
pub fn normalize(item: &SourceItem, policy: ItemPolicy) -> Normalized {
    match item.item_type {
        ItemType::Login | ItemType::SecureNote => {}
        ItemType::Card | ItemType::Identity if policy == ItemPolicy::Flatten => {}
        ItemType::Card | ItemType::Identity => {
            return Normalized::Skip(SkipReason::UnsupportedType(item.item_type));
        }
        ItemType::Other(n) => return Normalized::Skip(SkipReason::UnknownType(n)),
    }

    let login = item.login.as_ref();
    let mut entry = NormalizedEntry {
        title: item.name.clone(),
        username: login
            .and_then(|l| l.username.clone())
            .unwrap_or_default(),
        password: login
            .and_then(|l| l.password.clone())
            .unwrap_or_default(),
        notes: item.notes.clone(),
        ..Default::default()
    };

    if let Some(totp) = login
        .and_then(|l| l.totp.as_deref())
        .and_then(parse_totp)
    {
        entry
            .properties
            .push(EntryProperty::protected(TOTP_SEED_PROPERTY, totp.secret.as_str()));
        entry
            .properties
            .push(EntryProperty::plain(TOTP_SETTINGS_PROPERTY, totp.settings_value()));
    }

    if let Some(login) = login {
        let urls = classify_uris(login.uris.iter().map(|u| u.uri.as_deref()));
        entry.url = urls.primary;
        entry.properties.extend(urls.properties);
    }

    if policy == ItemPolicy::Flatten {
        entry.properties.extend(flattened_attributes(item));
    }

    entry.properties.extend(item.fields.iter().map(|field| EntryProperty {
        name: field.name.clone().unwrap_or_default(),
        value: field.value.clone().unwrap_or_default(),
        sensitive: field.field_type.is_sensitive(),
    }));

    entry.attachments = item
        .attachments
        .iter()
        .map(|a| AttachmentRef {
            id: a.id.clone(),
            file_name: a.file_name.clone(),
        })
        .collect();

    Normalized::Entry(entry)
}

/// Non-empty card and identity attributes as properties
fn flattened_attributes(item: &SourceItem) -> Vec<EntryProperty> {
    let mut attributes = Vec::new();
    if let Some(card) = &item.card {
        attributes.extend(card.attributes());
    }
    if let Some(identity) = &item.identity {
        attributes.extend(identity.attributes());
    }

    attributes
        .into_iter()
        .filter_map(|(name, value, sensitive)| match value {
            Some(value) if !value.is_empty() => Some(EntryProperty {
                name: name.to_string(),
                value: value.to_string(),
                sensitive,
            }),
            _ => None,
        })
        .collect()
}
