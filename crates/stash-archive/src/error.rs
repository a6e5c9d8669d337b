//! Error types for the stash-archive crate.
//!
//! [`ArchiveError`] covers every way a single archive task can fail. All
//! variants are terminal for the task that hit them and never for the
//! service: the dispatch loop logs the error and moves on.

use camino::{Utf8Path, Utf8PathBuf};

/// Errors that can occur while archiving one file.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The source file could not be read.
    ///
    /// Covers the source vanishing between dispatch and processing.
    #[error("failed to read source '{path}': {source}")]
    ReadSource {
        /// The source path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A destination file could not be created in the archive directory.
    ///
    /// Typically the archive root is missing or not writable. Fatal to
    /// the task, not to the process.
    #[error("failed to open destination for '{path}': {source}")]
    OpenDestination {
        /// The intended destination path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the compressed stream failed.
    #[error("failed to write compressed stream for '{path}': {source}")]
    WriteDestination {
        /// The intended destination path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The finished stream could not be moved to its final name.
    #[error("failed to persist archive '{path}': {source}")]
    Persist {
        /// The intended destination path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Appending a record to the history log failed.
    #[error("failed to append history record to '{path}': {source}")]
    History {
        /// The history log path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl ArchiveError {
    /// Creates a [`ArchiveError::ReadSource`] error.
    #[inline]
    pub fn read_source(path: &Utf8Path, source: std::io::Error) -> Self {
        Self::ReadSource {
            path: path.to_owned(),
            source,
        }
    }

    /// Creates a [`ArchiveError::OpenDestination`] error.
    #[inline]
    pub fn open_destination(path: &Utf8Path, source: std::io::Error) -> Self {
        Self::OpenDestination {
            path: path.to_owned(),
            source,
        }
    }

    /// Creates a [`ArchiveError::WriteDestination`] error.
    #[inline]
    pub fn write_destination(path: &Utf8Path, source: std::io::Error) -> Self {
        Self::WriteDestination {
            path: path.to_owned(),
            source,
        }
    }

    /// Returns the file path this error is about.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::ReadSource { path, .. }
            | Self::OpenDestination { path, .. }
            | Self::WriteDestination { path, .. }
            | Self::Persist { path, .. }
            | Self::History { path, .. } => path,
        }
    }
}
