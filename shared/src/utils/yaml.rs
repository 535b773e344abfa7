//! Serialization helpers for vault archive contents
//!
//! Records inside the archive are YAML. A whole file map can also be
//! rendered as a JSON document of base64 payloads, which is how the
//! in-memory file provider seals archives.

use base64::prelude::*;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

use crate::store::errors::{StoreError, StoreResult};
use crate::store::types::FileMap;

/// Serialize a record to YAML bytes
pub fn serialize_record<T: Serialize>(what: &str, value: &T) -> StoreResult<Vec<u8>> {
    serde_yaml::to_string(value)
        .map(String::into_bytes)
        .map_err(|e| StoreError::Serialization {
            message: format!("Failed to serialize {what}: {e}"),
        })
}

/// Deserialize a record from YAML bytes
pub fn deserialize_record<T: DeserializeOwned>(what: &str, data: &[u8]) -> StoreResult<T> {
    serde_yaml::from_slice(data).map_err(|e| StoreError::Serialization {
        message: format!("Failed to deserialize {what}: {e}"),
    })
}

/// Serialize a file map to a JSON string of base64 payloads
pub fn serialize_file_map(file_map: &FileMap) -> StoreResult<String> {
    let json_map: HashMap<&str, String> = file_map
        .iter()
        .map(|(path, data)| (path.as_str(), BASE64_STANDARD.encode(data)))
        .collect();

    serde_json::to_string(&json_map).map_err(|e| StoreError::Serialization {
        message: format!("Failed to serialize file map: {e}"),
    })
}

/// Deserialize a file map from a JSON string of base64 payloads
pub fn deserialize_file_map(json: &str) -> StoreResult<FileMap> {
    let json_map: HashMap<String, String> =
        serde_json::from_str(json).map_err(|e| StoreError::Serialization {
            message: format!("Failed to deserialize file map JSON: {e}"),
        })?;

    let mut file_map = HashMap::with_capacity(json_map.len());
    for (path, base64_data) in json_map {
        let data = BASE64_STANDARD
            .decode(&base64_data)
            .map_err(|e| StoreError::Serialization {
                message: format!("Failed to decode base64 data for {path}: {e}"),
            })?;
        file_map.insert(path, data);
    }

    Ok(file_map)
}
