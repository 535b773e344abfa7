//! Bitwarden vault records as emitted by `bw list folders` and `bw list items`
//!
//! Only the attributes the migration reads are modelled; everything else in
//! the CLI output is ignored during deserialization.

use serde::{Deserialize, Deserializer, Serialize};

/// A folder record. The CLI always includes a synthetic "No Folder" entry
/// whose id is `null`; that record stands for the vault root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFolder {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

impl SourceFolder {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
        }
    }

    /// The root sentinel (no id, no name)
    pub fn root() -> Self {
        Self {
            id: None,
            name: String::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.id.is_none()
    }
}

/// Vault item type, carried on the wire as a small integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ItemType {
    Login,
    SecureNote,
    Card,
    Identity,
    /// Any type this tool does not know how to convert (SSH keys, future types)
    Other(u8),
}

impl From<u8> for ItemType {
    fn from(value: u8) -> Self {
        match value {
            1 => ItemType::Login,
            2 => ItemType::SecureNote,
            3 => ItemType::Card,
            4 => ItemType::Identity,
            other => ItemType::Other(other),
        }
    }
}

impl From<ItemType> for u8 {
    fn from(value: ItemType) -> Self {
        match value {
            ItemType::Login => 1,
            ItemType::SecureNote => 2,
            ItemType::Card => 3,
            ItemType::Identity => 4,
            ItemType::Other(other) => other,
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemType::Login => write!(f, "login"),
            ItemType::SecureNote => write!(f, "secure note"),
            ItemType::Card => write!(f, "card"),
            ItemType::Identity => write!(f, "identity"),
            ItemType::Other(n) => write!(f, "type {n}"),
        }
    }
}

/// Custom field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum CustomFieldType {
    Text,
    Hidden,
    Boolean,
    Linked,
    Other(u8),
}

impl CustomFieldType {
    /// Whether values of this type must be stored protected
    pub fn is_sensitive(self) -> bool {
        self == CustomFieldType::Hidden
    }
}

impl From<u8> for CustomFieldType {
    fn from(value: u8) -> Self {
        match value {
            0 => CustomFieldType::Text,
            1 => CustomFieldType::Hidden,
            2 => CustomFieldType::Boolean,
            3 => CustomFieldType::Linked,
            other => CustomFieldType::Other(other),
        }
    }
}

impl From<CustomFieldType> for u8 {
    fn from(value: CustomFieldType) -> Self {
        match value {
            CustomFieldType::Text => 0,
            CustomFieldType::Hidden => 1,
            CustomFieldType::Boolean => 2,
            CustomFieldType::Linked => 3,
            CustomFieldType::Other(other) => other,
        }
    }
}

/// A login URI entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUri {
    #[serde(default)]
    pub uri: Option<String>,
}

impl LoginUri {
    pub fn new<S: Into<String>>(uri: S) -> Self {
        Self {
            uri: Some(uri.into()),
        }
    }
}

/// Login sub-record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub totp: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uris: Vec<LoginUri>,
}

/// Card sub-record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardData {
    pub cardholder_name: Option<String>,
    pub brand: Option<String>,
    pub number: Option<String>,
    pub exp_month: Option<String>,
    pub exp_year: Option<String>,
    pub code: Option<String>,
}

impl CardData {
    /// `(attribute name, value, sensitive)` in display order
    pub fn attributes(&self) -> Vec<(&'static str, Option<&str>, bool)> {
        vec![
            ("cardholderName", self.cardholder_name.as_deref(), false),
            ("brand", self.brand.as_deref(), false),
            ("number", self.number.as_deref(), true),
            ("expMonth", self.exp_month.as_deref(), false),
            ("expYear", self.exp_year.as_deref(), false),
            ("code", self.code.as_deref(), true),
        ]
    }
}

/// Identity sub-record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityData {
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub address3: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub ssn: Option<String>,
    pub username: Option<String>,
    pub passport_number: Option<String>,
    pub license_number: Option<String>,
}

impl IdentityData {
    /// `(attribute name, value, sensitive)` in display order
    pub fn attributes(&self) -> Vec<(&'static str, Option<&str>, bool)> {
        vec![
            ("title", self.title.as_deref(), false),
            ("firstName", self.first_name.as_deref(), false),
            ("middleName", self.middle_name.as_deref(), false),
            ("lastName", self.last_name.as_deref(), false),
            ("address1", self.address1.as_deref(), false),
            ("address2", self.address2.as_deref(), false),
            ("address3", self.address3.as_deref(), false),
            ("city", self.city.as_deref(), false),
            ("state", self.state.as_deref(), false),
            ("postalCode", self.postal_code.as_deref(), false),
            ("country", self.country.as_deref(), false),
            ("company", self.company.as_deref(), false),
            ("email", self.email.as_deref(), false),
            ("phone", self.phone.as_deref(), false),
            ("ssn", self.ssn.as_deref(), true),
            ("username", self.username.as_deref(), false),
            ("passportNumber", self.passport_number.as_deref(), true),
            ("licenseNumber", self.license_number.as_deref(), true),
        ]
    }
}

/// A custom field on an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub field_type: CustomFieldType,
}

impl CustomField {
    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
            field_type: CustomFieldType::Text,
        }
    }

    pub fn hidden(name: &str, value: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
            field_type: CustomFieldType::Hidden,
        }
    }
}

/// Attachment metadata; the bytes are fetched separately
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInfo {
    pub id: String,
    pub file_name: String,
}

/// A vault item (cipher)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub login: Option<LoginData>,
    #[serde(default)]
    pub card: Option<CardData>,
    #[serde(default)]
    pub identity: Option<IdentityData>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fields: Vec<CustomField>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attachments: Vec<AttachmentInfo>,
}

impl SourceItem {
    /// Create a bare item of the given type (used by tests and fixtures)
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N, item_type: ItemType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            folder_id: None,
            item_type,
            notes: None,
            login: None,
            card: None,
            identity: None,
            fields: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Create a login item with username and password set
    pub fn login<I: Into<String>, N: Into<String>>(
        id: I,
        name: N,
        username: &str,
        password: &str,
    ) -> Self {
        let mut item = Self::new(id, name, ItemType::Login);
        item.login = Some(LoginData {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        });
        item
    }

    pub fn in_folder<S: Into<String>>(mut self, folder_id: S) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }
}

/// `null` and a missing key both mean "no entries"
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_folder_list() {
        let json = r#"[
            {"object":"folder","id":null,"name":"No Folder"},
            {"object":"folder","id":"f1","name":"Work/Email"}
        ]"#;
        let folders: Vec<SourceFolder> = serde_json::from_str(json).unwrap();
        assert_eq!(folders.len(), 2);
        assert!(folders[0].is_root());
        assert_eq!(folders[1], SourceFolder::new("f1", "Work/Email"));
    }

    #[test]
    fn test_parse_login_item() {
        let json = r#"{
            "object": "item",
            "id": "i1",
            "organizationId": null,
            "folderId": "f1",
            "type": 1,
            "reprompt": 0,
            "name": "Mail",
            "notes": null,
            "favorite": false,
            "login": {
                "uris": [{"match": null, "uri": "https://mail.example.com"}, {"uri": null}],
                "username": "alice",
                "password": null,
                "totp": "JBSWY3DPEHPK3PXP"
            },
            "fields": [{"name": "pin", "value": "1234", "type": 1, "linkedId": null}],
            "attachments": [{"id": "a1", "fileName": "key.pem", "size": "12", "sizeName": "12 Bytes"}]
        }"#;
        let item: SourceItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.item_type, ItemType::Login);
        assert_eq!(item.folder_id.as_deref(), Some("f1"));

        let login = item.login.as_ref().unwrap();
        assert_eq!(login.username.as_deref(), Some("alice"));
        assert_eq!(login.password, None);
        assert_eq!(login.uris.len(), 2);
        assert_eq!(login.uris[1].uri, None);

        assert_eq!(item.fields[0].field_type, CustomFieldType::Hidden);
        assert!(item.fields[0].field_type.is_sensitive());
        assert_eq!(item.attachments[0].file_name, "key.pem");
    }

    #[test]
    fn test_null_collections_become_empty() {
        let json = r#"{"id":"i2","name":"Note","type":2,"fields":null,"login":{"uris":null}}"#;
        let item: SourceItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.item_type, ItemType::SecureNote);
        assert!(item.fields.is_empty());
        assert!(item.attachments.is_empty());
        assert!(item.login.unwrap().uris.is_empty());
    }

    #[test]
    fn test_unknown_item_type_is_preserved() {
        let json = r#"{"id":"i3","name":"Server key","type":5}"#;
        let item: SourceItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.item_type, ItemType::Other(5));
        assert_eq!(u8::from(item.item_type), 5);
    }
}
