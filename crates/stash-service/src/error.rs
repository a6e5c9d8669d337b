//! Error types for the stash-service crate.

use stash_core::ConfigError;
use stash_watcher::WatchError;

/// Errors that can abort service startup.
///
/// Once the dispatch loop is running, nothing maps to this type any
/// more: per-task and per-event failures are logged where they happen
/// and never cross back into the loop.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The watch tree could not be created or seeded.
    #[error("watcher failed: {0}")]
    Watch(#[from] WatchError),

    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error occurred during startup.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_config_conversion() {
        let error = ServiceError::from(ConfigError::MissingDirectory(Utf8PathBuf::from("archive")));
        assert!(error.to_string().contains("invalid configuration"));
        assert!(error.to_string().contains("archive"));
    }

    #[test]
    fn test_watch_conversion() {
        let error = ServiceError::from(WatchError::root_not_found("monitored"));
        assert!(error.to_string().contains("watcher failed"));
    }
}
