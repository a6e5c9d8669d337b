//! Tagged watch events.
//!
//! Everything the dispatch loop consumes arrives as one [`WatchEvent`]
//! enum on one ordered channel: directory creations, file writes, and
//! transport errors from the notification layer. Collapsing the separate
//! event and error streams of the OS layer into a single tagged type keeps
//! the dispatcher a plain match over event kind.
//!
//! # Classification
//!
//! Raw `notify` events are classified by [`from_notify`]:
//!
//! - Creation of a directory → [`WatchEvent::DirectoryCreated`]
//! - Data modification of a file → [`WatchEvent::FileWritten`]
//! - Everything else is dropped at trace level
//!
//! File *creation* deliberately does not trigger archiving: a create
//! fires when an empty handle is allocated, before content exists, and
//! acting on it would compress zero bytes. The write that follows is the
//! correct trigger. Creation is only meaningful for directories, which
//! must join the watch set before their contents can be observed.

use camino::{Utf8Path, Utf8PathBuf};
use notify::event::{CreateKind, EventKind, ModifyKind};

/// One observed filesystem change, as seen by the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A directory appeared under the watched tree and needs registering.
    DirectoryCreated(Utf8PathBuf),

    /// A file under the watched tree received content.
    FileWritten(Utf8PathBuf),

    /// The notification layer reported an error.
    ///
    /// Transport errors are logged by the dispatcher and never terminate
    /// the watch loop.
    TransportError(String),
}

impl WatchEvent {
    /// Returns the path this event refers to, if it has one.
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::DirectoryCreated(path) | Self::FileWritten(path) => Some(path),
            Self::TransportError(_) => None,
        }
    }

    /// Returns `true` for [`WatchEvent::DirectoryCreated`].
    #[inline]
    #[must_use]
    pub fn is_directory_created(&self) -> bool {
        matches!(self, Self::DirectoryCreated(_))
    }

    /// Returns `true` for [`WatchEvent::FileWritten`].
    #[inline]
    #[must_use]
    pub fn is_file_written(&self) -> bool {
        matches!(self, Self::FileWritten(_))
    }
}

/// Classifies one raw notify event into zero or more watch events.
///
/// A notify event can carry several paths; each is classified on its own.
/// Non-UTF-8 paths are logged and skipped. Creation events with an
/// ambiguous kind (`CreateKind::Any`) are resolved with a stat, since
/// some backends do not distinguish files from folders.
#[must_use]
pub fn from_notify(event: notify::Event) -> Vec<WatchEvent> {
    let kind = event.kind;
    let mut out = Vec::with_capacity(event.paths.len());

    for path in event.paths {
        let path = match Utf8PathBuf::try_from(path) {
            Ok(p) => p,
            Err(e) => {
                let invalid = e.into_path_buf();
                tracing::warn!(
                    path = %invalid.display(),
                    "Skipping non-UTF-8 path in watch event"
                );
                continue;
            }
        };

        match kind {
            EventKind::Create(CreateKind::Folder) => {
                out.push(WatchEvent::DirectoryCreated(path));
            }
            EventKind::Create(CreateKind::Any | CreateKind::Other) if path.is_dir() => {
                out.push(WatchEvent::DirectoryCreated(path));
            }
            EventKind::Create(_) => {
                // A file handle was allocated; the write event will follow.
                tracing::trace!(path = %path, "Ignoring file creation, waiting for write");
            }
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) if path.is_file() => {
                out.push(WatchEvent::FileWritten(path));
            }
            _ => {
                tracing::trace!(path = %path, kind = ?kind, "Dropping unhandled event kind");
            }
        }
    }

    out
}
