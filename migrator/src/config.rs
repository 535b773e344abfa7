//! Configuration for the migrator
//!
//! Settings come from an optional YAML file. Values given on the command
//! line are applied on top afterwards by the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::{ConfigError, ConfigResult};
use crate::source::DEFAULT_BW_PATH;
use vaultport_shared::normalize::ItemPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bitwarden CLI settings
    pub source: SourceConfig,

    /// Conversion settings
    pub migration: MigrationConfig,

    /// Destination vault settings
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// `bw` executable, either a name looked up on PATH or a path
    pub bw_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// What to do with card and identity items
    pub item_policy: ItemPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Minimum master password length for newly created vaults
    pub min_password_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (`info`, `debug`, `vaultport_migrator=trace`)
    pub level: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            bw_path: DEFAULT_BW_PATH.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            min_password_length: Some(8),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// `<config dir>/vaultport/config.yml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("vaultport");
            p.push("config.yml");
            p
        })
    }

    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from: {:?}", path);

        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_string_lossy().to_string(),
            message: e.to_string(),
        })?;

        // An empty file means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content)?;
        info!("Configuration loaded from {:?}", path);
        Ok(config)
    }

    /// Load an explicitly given file, or the default file when it exists.
    ///
    /// A missing explicit file is an error; a missing default file is not.
    pub fn load_or_default(explicit: Option<&Path>) -> ConfigResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(path),
                _ => {
                    debug!("No configuration file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source.bw_path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "source.bw_path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.storage.min_password_length == Some(0) {
            return Err(ConfigError::Invalid {
                field: "storage.min_password_length".to_string(),
                reason: "must be greater than 0 when set".to_string(),
            });
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigError::Invalid {
                field: "logging.level".to_string(),
                reason: e.to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.source.bw_path, "bw");
        assert_eq!(config.migration.item_policy, ItemPolicy::Skip);
        assert_eq!(config.storage.min_password_length, Some(8));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = config_file("migration:\n  item_policy: flatten\n");
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.migration.item_policy, ItemPolicy::Flatten);
        assert_eq!(config.source.bw_path, "bw");
        assert_eq!(config.storage.min_password_length, Some(8));
    }

    #[test]
    fn test_full_file() {
        let file = config_file(
            "source:\n  bw_path: /opt/bw/bw\n\
             storage:\n  min_password_length: 12\n\
             logging:\n  level: debug\n",
        );
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.source.bw_path, "/opt/bw/bw");
        assert_eq!(config.storage.min_password_length, Some(12));
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = config_file("");
        assert_eq!(Config::load(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yml");
        assert_matches!(
            Config::load_or_default(Some(&path)),
            Err(ConfigError::NotFound { .. })
        );
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        let file = config_file("migration:\n  item_policy: merge\n");
        assert_matches!(Config::load(file.path()), Err(ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.storage.min_password_length = Some(0);
        assert_matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "storage.min_password_length"
        );

        let mut config = Config::default();
        config.storage.min_password_length = None;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.logging.level = "vaultport=loud".to_string();
        assert_matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "logging.level"
        );

        let mut config = Config::default();
        config.source.bw_path = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
