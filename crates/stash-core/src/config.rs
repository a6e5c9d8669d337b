//! Configuration structures for the stashd service.
//!
//! This module provides configuration types for all components of the service:
//!
//! - [`ArchiveConfig`] - Filesystem layout (watched root, archive root, history log)
//! - [`WatchConfig`] - Event channel and shutdown settings
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] with the conventional layout:
//! `monitored/` as the watched root, `archive/` as the archive root, and
//! `service_history.log` as the history file, all relative to the working
//! directory.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Filesystem layout for the archiving service.
///
/// Both directories must exist before the service starts; the service never
/// creates them. The history file is created on first append.
///
/// # Examples
///
/// ```
/// use stash_core::ArchiveConfig;
///
/// let config = ArchiveConfig::default();
/// assert_eq!(config.monitored_root, "monitored");
/// assert_eq!(config.archive_root, "archive");
/// assert_eq!(config.history_path, "service_history.log");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Root of the directory tree under live observation.
    pub monitored_root: Utf8PathBuf,

    /// Directory receiving all compressed outputs.
    pub archive_root: Utf8PathBuf,

    /// Append-only log of per-file compression records.
    pub history_path: Utf8PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            monitored_root: Utf8PathBuf::from("monitored"),
            archive_root: Utf8PathBuf::from("archive"),
            history_path: Utf8PathBuf::from("service_history.log"),
        }
    }
}

/// Event channel and shutdown settings for the watch loop.
///
/// # Examples
///
/// ```
/// use stash_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.channel_capacity, 100);
/// assert_eq!(config.shutdown_grace_ms, 5000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Capacity of the bounded event channel between the OS notification
    /// callback and the dispatch loop.
    pub channel_capacity: usize,

    /// How long in-flight archive tasks may keep running after a shutdown
    /// signal before they are aborted.
    pub shutdown_grace_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
            shutdown_grace_ms: 5000,
        }
    }
}

/// Root configuration for the stashd service.
///
/// Can be loaded from a JSON file with [`Config::from_json_file`] or built
/// programmatically; missing fields fall back to their defaults.
///
/// # Examples
///
/// ```
/// use stash_core::Config;
///
/// let config = Config::default();
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// assert!(json.contains("monitored"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filesystem layout.
    pub archive: ArchiveConfig,

    /// Watch loop settings.
    pub watch: WatchConfig,
}

impl Config {
    /// Loads configuration from a JSON file.
    ///
    /// Fields absent from the file keep their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid JSON.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_std_path())?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Validates that the configured directories exist.
    ///
    /// The watched root and the archive root must both be pre-existing
    /// directories; the service refuses to start otherwise. The history
    /// file is not checked since it is created on first append.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDirectory`] or
    /// [`ConfigError::NotADirectory`] for the first offending path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for dir in [&self.archive.monitored_root, &self.archive.archive_root] {
            if !dir.exists() {
                return Err(ConfigError::MissingDirectory(dir.clone()));
            }
            if !dir.is_dir() {
                return Err(ConfigError::NotADirectory(dir.clone()));
            }
        }

        if self.watch.channel_capacity == 0 {
            return Err(ConfigError::InvalidOption {
                option: "channel_capacity".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_archive_config_defaults() {
        let config = ArchiveConfig::default();
        assert_eq!(config.monitored_root, "monitored");
        assert_eq!(config.archive_root, "archive");
        assert_eq!(config.history_path, "service_history.log");
    }

    #[test]
    fn test_watch_config_defaults() {
        let config = WatchConfig::default();
        assert_eq!(config.channel_capacity, 100);
        assert_eq!(config.shutdown_grace_ms, 5000);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"archive": {"monitored_root": "inbox"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.archive.monitored_root, "inbox");
        // Other fields should have defaults
        assert_eq!(config.archive.archive_root, "archive");
        assert_eq!(config.watch.channel_capacity, 100);
    }

    #[test]
    fn test_config_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"watch": {"shutdown_grace_ms": 250}}"#).unwrap();

        let utf8 = Utf8Path::from_path(&path).unwrap();
        let config = Config::from_json_file(utf8).unwrap();
        assert_eq!(config.watch.shutdown_grace_ms, 250);
        assert_eq!(config.archive.monitored_root, "monitored");
    }

    #[test]
    fn test_config_from_json_file_missing() {
        let result = Config::from_json_file(Utf8Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_validate_missing_monitored_root() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let mut config = Config::default();
        config.archive.monitored_root = root.join("missing");
        config.archive.archive_root = root.to_owned();

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::MissingDirectory(_))));
    }

    #[test]
    fn test_validate_archive_root_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        fs::write(root.join("archive").as_std_path(), "not a dir").unwrap();

        let mut config = Config::default();
        config.archive.monitored_root = root.to_owned();
        config.archive.archive_root = root.join("archive");

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::NotADirectory(_))));
    }

    #[test]
    fn test_validate_zero_channel_capacity() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let mut config = Config::default();
        config.archive.monitored_root = root.to_owned();
        config.archive.archive_root = root.to_owned();
        config.watch.channel_capacity = 0;

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::InvalidOption { .. })));
    }

    #[test]
    fn test_validate_ok() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let mut config = Config::default();
        config.archive.monitored_root = root.to_owned();
        config.archive.archive_root = root.to_owned();

        assert!(config.validate().is_ok());
    }
}
