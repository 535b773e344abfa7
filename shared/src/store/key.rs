//! Composite master key
//!
//! A vault is opened with its master password and, optionally, a key file.
//! The archive password is derived from both: the password alone, or the
//! password followed by the SHA-256 of the key file contents.

use std::fmt;
use std::path::Path;

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::store::errors::{StoreError, StoreResult};

pub struct CompositeKey {
    archive_password: Zeroizing<String>,
    password_chars: usize,
    has_keyfile: bool,
}

impl CompositeKey {
    /// Build a key from the master password and an optional key file path
    pub fn new(password: &str, keyfile: Option<&Path>) -> StoreResult<Self> {
        let contents = match keyfile {
            Some(path) => Some(Zeroizing::new(std::fs::read(path).map_err(|e| {
                StoreError::KeyFile {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            })?)),
            None => None,
        };

        Self::from_parts(password, contents.as_ref().map(|c| c.as_slice()))
    }

    /// Build a key from the master password and key file contents
    pub fn from_parts(password: &str, keyfile: Option<&[u8]>) -> StoreResult<Self> {
        if password.is_empty() {
            return Err(StoreError::EmptyPassword);
        }

        let archive_password = match keyfile {
            Some(contents) => Zeroizing::new(format!(
                "{password}:{:x}",
                Sha256::digest(contents)
            )),
            None => Zeroizing::new(password.to_string()),
        };

        Ok(Self {
            archive_password,
            password_chars: password.chars().count(),
            has_keyfile: keyfile.is_some(),
        })
    }

    /// Reject master passwords shorter than `min_length` characters
    pub fn check_strength(&self, min_length: usize) -> StoreResult<()> {
        if self.password_chars < min_length {
            return Err(StoreError::WeakPassword { min_length });
        }
        Ok(())
    }

    pub fn has_keyfile(&self) -> bool {
        self.has_keyfile
    }

    pub(crate) fn archive_password(&self) -> &str {
        &self.archive_password
    }
}

impl fmt::Debug for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeKey")
            .field("archive_password", &"[REDACTED]")
            .field("has_keyfile", &self.has_keyfile)
            .finish()
    }
}
