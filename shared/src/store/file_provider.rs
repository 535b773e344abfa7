//! File operation providers for the vault store
//!
//! The store never touches the filesystem itself. It hands archive bytes and
//! file maps to a [`FileOperationProvider`], which knows how to persist and
//! encrypt them.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::store::errors::{FileError, FileResult};
use crate::store::types::FileMap;
use crate::utils::yaml::{deserialize_file_map, serialize_file_map};

/// Archive I/O and encryption used by the vault store
pub trait FileOperationProvider: Send + Sync {
    /// Read an archive file
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - Archive contents
    /// * `Err(FileError::NotFound)` - If nothing exists at `path`
    fn read_archive(&self, path: &str) -> FileResult<Vec<u8>>;

    /// Write archive bytes, creating parent directories as needed
    fn write_archive(&self, path: &str, data: &[u8]) -> FileResult<()>;

    /// Decrypt and extract an archive into a file map
    ///
    /// # Returns
    /// * `Ok(FileMap)` - Extracted files as path -> content
    /// * `Err(FileError::InvalidPassword)` - If the password does not open the archive
    fn extract_archive(&self, data: &[u8], password: &str) -> FileResult<FileMap>;

    /// Create an AES-256 encrypted archive from a file map
    fn create_archive(&self, files: FileMap, password: &str) -> FileResult<Vec<u8>>;
}

/// Provider backed by real files and sevenz-rust2
#[derive(Debug, Default)]
pub struct DesktopFileProvider;

impl DesktopFileProvider {
    pub fn new() -> Self {
        Self
    }
}

impl FileOperationProvider for DesktopFileProvider {
    fn read_archive(&self, path: &str) -> FileResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound {
                path: path.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => FileError::PermissionDenied {
                path: path.to_string(),
            },
            _ => FileError::IoError {
                message: format!("Failed to read archive '{path}': {e}"),
            },
        })
    }

    fn write_archive(&self, path: &str, data: &[u8]) -> FileResult<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| FileError::IoError {
                    message: format!("Failed to create directory for '{path}': {e}"),
                })?;
            }
        }

        std::fs::write(path, data).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => FileError::PermissionDenied {
                path: path.to_string(),
            },
            _ => FileError::IoError {
                message: format!("Failed to write archive '{path}': {e}"),
            },
        })
    }

    fn extract_archive(&self, data: &[u8], password: &str) -> FileResult<FileMap> {
        // sevenz-rust2 works on paths, so stage the bytes in a scratch directory
        let staging = tempfile::tempdir().map_err(|e| FileError::ExtractionFailed {
            message: format!("Failed to create staging directory: {e}"),
        })?;
        let archive_path = staging.path().join("vault.7z");
        let extract_dir = staging.path().join("contents");

        std::fs::write(&archive_path, data).map_err(|e| FileError::ExtractionFailed {
            message: format!("Failed to stage archive: {e}"),
        })?;
        std::fs::create_dir_all(&extract_dir).map_err(|e| FileError::ExtractionFailed {
            message: format!("Failed to create extraction directory: {e}"),
        })?;

        let result = if password.is_empty() {
            sevenz_rust2::decompress_file(&archive_path, &extract_dir)
        } else {
            sevenz_rust2::decompress_file_with_password(
                &archive_path,
                &extract_dir,
                password.into(),
            )
        };

        if let Err(e) = result {
            let error_str = e.to_string().to_lowercase();
            return if error_str.contains("password")
                || error_str.contains("wrong")
                || error_str.contains("decrypt")
            {
                Err(FileError::InvalidPassword)
            } else {
                Err(FileError::ExtractionFailed {
                    message: format!("Failed to extract 7z archive: {e}"),
                })
            };
        }

        let mut file_map = HashMap::new();
        read_dir_recursive(&extract_dir, &extract_dir, &mut file_map).map_err(|e| {
            FileError::ExtractionFailed {
                message: format!("Failed to read extracted files: {e}"),
            }
        })?;

        debug!("Extracted {} files from archive", file_map.len());
        Ok(file_map)
    }

    fn create_archive(&self, files: FileMap, password: &str) -> FileResult<Vec<u8>> {
        let staging = tempfile::tempdir().map_err(|e| FileError::CreationFailed {
            message: format!("Failed to create staging directory: {e}"),
        })?;
        let content_dir = staging.path().join("contents");
        let archive_path = staging.path().join("vault.7z");

        std::fs::create_dir_all(&content_dir).map_err(|e| FileError::CreationFailed {
            message: format!("Failed to create content directory: {e}"),
        })?;

        for (path, content) in files {
            let file_path = content_dir.join(&path);
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| FileError::CreationFailed {
                    message: format!("Failed to create directory structure: {e}"),
                })?;
            }
            std::fs::write(&file_path, content).map_err(|e| FileError::CreationFailed {
                message: format!("Failed to write file '{path}': {e}"),
            })?;
        }

        let result = if password.is_empty() {
            sevenz_rust2::compress_to_path(&content_dir, &archive_path)
        } else {
            sevenz_rust2::compress_to_path_encrypted(&content_dir, &archive_path, password.into())
        };
        result.map_err(|e| FileError::CreationFailed {
            message: format!("Failed to create 7z archive: {e}"),
        })?;

        std::fs::read(&archive_path).map_err(|e| FileError::CreationFailed {
            message: format!("Failed to read created archive: {e}"),
        })
    }
}

fn read_dir_recursive(dir: &Path, base: &Path, file_map: &mut FileMap) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            read_dir_recursive(&path, base, file_map)?;
        } else if path.is_file() {
            let relative = path
                .strip_prefix(base)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            // Archive paths always use '/'
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            file_map.insert(key, std::fs::read(&path)?);
        }
    }
    Ok(())
}

/// Sealed form of an in-memory archive
#[derive(Serialize, Deserialize)]
struct SealedArchive {
    password_sha256: String,
    files: String,
}

fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// In-memory provider for tests
///
/// Clones share the same set of archives, so a vault saved through one
/// handle can be reopened through another. Sealed archives are JSON
/// documents carrying a digest of the password, which makes a wrong
/// password fail exactly like it does with a real archive.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileProvider {
    archives: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_writes: bool,
}

impl MemoryFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose writes are rejected
    pub fn with_failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Store raw archive bytes at `path`
    pub fn add_archive<P: Into<String>>(&self, path: P, data: Vec<u8>) -> FileResult<()> {
        self.lock()?.insert(path.into(), data);
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().map(|a| a.contains_key(path)).unwrap_or(false)
    }

    fn lock(&self) -> FileResult<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.archives.lock().map_err(|_| FileError::IoError {
            message: "archive table lock poisoned".to_string(),
        })
    }
}

impl FileOperationProvider for MemoryFileProvider {
    fn read_archive(&self, path: &str) -> FileResult<Vec<u8>> {
        self.lock()?
            .get(path)
            .cloned()
            .ok_or_else(|| FileError::NotFound {
                path: path.to_string(),
            })
    }

    fn write_archive(&self, path: &str, data: &[u8]) -> FileResult<()> {
        if self.fail_writes {
            return Err(FileError::PermissionDenied {
                path: path.to_string(),
            });
        }
        self.lock()?.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn extract_archive(&self, data: &[u8], password: &str) -> FileResult<FileMap> {
        let sealed: SealedArchive =
            serde_json::from_slice(data).map_err(|e| FileError::CorruptedArchive {
                message: e.to_string(),
            })?;

        if sealed.password_sha256 != password_digest(password) {
            return Err(FileError::InvalidPassword);
        }

        deserialize_file_map(&sealed.files).map_err(|e| FileError::CorruptedArchive {
            message: e.to_string(),
        })
    }

    fn create_archive(&self, files: FileMap, password: &str) -> FileResult<Vec<u8>> {
        let sealed = SealedArchive {
            password_sha256: password_digest(password),
            files: serialize_file_map(&files).map_err(|e| FileError::CreationFailed {
                message: e.to_string(),
            })?,
        };

        serde_json::to_vec(&sealed).map_err(|e| FileError::CreationFailed {
            message: e.to_string(),
        })
    }
}
