//! Error types for the stash-watcher crate.

use camino::Utf8PathBuf;

/// Errors that can occur while setting up or extending the watch tree.
///
/// Creation-time failures are fatal to the service (there is nothing to
/// watch without a watcher); registration failures for individual
/// directories are logged by the dispatcher and degrade coverage for that
/// subtree only.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Failed to initialize or operate the notify watcher.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The watched root does not exist.
    #[error("watched root does not exist: {0}")]
    RootNotFound(Utf8PathBuf),

    /// The watched root exists but is not a directory.
    #[error("watched root is not a directory: {0}")]
    RootNotDirectory(Utf8PathBuf),

    /// An I/O error occurred while validating paths.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Creates a new [`WatchError::RootNotFound`] error.
    #[inline]
    pub fn root_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::RootNotFound(path.into())
    }

    /// Creates a new [`WatchError::RootNotDirectory`] error.
    #[inline]
    pub fn root_not_directory(path: impl Into<Utf8PathBuf>) -> Self {
        Self::RootNotDirectory(path.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_found_display() {
        let error = WatchError::root_not_found("monitored");
        assert_eq!(error.to_string(), "watched root does not exist: monitored");
    }

    #[test]
    fn test_root_not_directory_display() {
        let error = WatchError::root_not_directory("monitored");
        assert!(error.to_string().contains("not a directory"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = WatchError::from(io);
        assert!(error.to_string().contains("I/O error"));
    }
}
