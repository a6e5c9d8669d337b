//! The watch tree: OS watcher, watch set, and async event stream.
//!
//! This module provides [`WatchTree`], which bridges the synchronous
//! `notify` file watching crate to the async tokio runtime and owns the
//! set of directories currently under observation.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                  Notify Callback Thread                    │
//! │  ┌──────────────────┐   ┌──────────┐   ┌───────────────┐  │
//! │  │ RecommendedWatcher│ ->│ classify │ ->│ filter        │  │
//! │  │ (one watch per    │   │ (tagged  │   │ (PathFilter)  │  │
//! │  │  directory)       │   │  events) │   └──────┬────────┘  │
//! │  └──────────────────┘   └──────────┘          │            │
//! └───────────────────────────────────────────────│────────────┘
//!                                  blocking_send  │
//!                                                 ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │                  Async Runtime (tokio)                     │
//! │  ┌──────────────────┐    ┌────────────────┐                │
//! │  │ WatchTree        │    │ mpsc::Receiver │ -> dispatcher  │
//! │  │ (watch set)      │    │ (WatchEvent)   │                │
//! │  └──────────────────┘    └────────────────┘                │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Recursion by registration
//!
//! Directories are watched in non-recursive mode, one OS watch each, and
//! the tree stays covered because the dispatcher registers every new
//! directory it hears about (plus a reconciliation scan for entries that
//! beat the registration). This keeps the watch set an explicit,
//! inspectable structure instead of a property of the backend, at the
//! cost of the registration window the reconciliation pass closes.
//!
//! # Single writer
//!
//! The watch set is mutated only through [`WatchTree::register`], and the
//! tree is owned by the dispatch loop, so no lock guards it.

use camino::{Utf8Path, Utf8PathBuf};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use stash_core::FxHashSet;

use crate::error::WatchError;
use crate::events::{self, WatchEvent};
use crate::filter::PathFilter;

/// The result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The directory was added to the watch set.
    Added,
    /// The directory was already watched; nothing changed.
    AlreadyWatched,
}

/// A recursive directory watch built from per-directory subscriptions.
///
/// # Lifecycle
///
/// 1. **Creation**: [`WatchTree::new`] validates the root, builds the
///    notify watcher with a classifying callback, and registers the root.
/// 2. **Growth**: the dispatcher calls [`register`](Self::register) for
///    every directory it discovers. Registration is idempotent and the
///    set only grows; nothing in scope ever unwatches a directory.
/// 3. **Shutdown**: dropping the tree stops the backend watcher and
///    closes the event channel.
///
/// # Examples
///
/// ```no_run
/// use stash_watcher::{AcceptAll, WatchTree};
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), stash_watcher::WatchError> {
/// let mut tree = WatchTree::new(Utf8Path::new("monitored"), 100, AcceptAll)?;
///
/// while let Some(event) = tree.recv().await {
///     println!("observed: {event:?}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct WatchTree {
    /// The backend watcher; owns the notification callback thread.
    watcher: RecommendedWatcher,

    /// Directories currently subscribed, by canonical path.
    watched: FxHashSet<Utf8PathBuf>,

    /// Event receiver for async consumption.
    event_rx: mpsc::Receiver<WatchEvent>,

    /// The canonicalized watched root.
    root: Utf8PathBuf,
}

impl std::fmt::Debug for WatchTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchTree")
            .field("root", &self.root)
            .field("watched", &self.watched.len())
            .finish_non_exhaustive()
    }
}

impl WatchTree {
    /// Creates a watch tree rooted at `root` and registers the root.
    ///
    /// Events are classified and filtered on the notification thread and
    /// delivered through a bounded channel of the given capacity; when
    /// the dispatcher falls behind, the notification thread blocks
    /// rather than dropping events.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::RootNotFound`] or
    /// [`WatchError::RootNotDirectory`] for an unusable root, and
    /// [`WatchError::Notify`] if the backend watcher cannot be created
    /// or the root cannot be watched. All of these are fatal-startup
    /// conditions for the service.
    pub fn new<F: PathFilter>(
        root: &Utf8Path,
        channel_capacity: usize,
        filter: F,
    ) -> Result<Self, WatchError> {
        if !root.exists() {
            return Err(WatchError::root_not_found(root));
        }
        if !root.is_dir() {
            return Err(WatchError::root_not_directory(root));
        }

        // Canonicalize so event paths (absolute from the backend) line up
        // with the watch set and the path mapper.
        let root = root.canonicalize_utf8().map_err(WatchError::Io)?;

        let (event_tx, event_rx) = mpsc::channel(channel_capacity);

        let watcher = RecommendedWatcher::new(
            move |result: Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    for watch_event in events::from_notify(event) {
                        if watch_event
                            .path()
                            .is_some_and(|path| !filter.should_observe(path))
                        {
                            tracing::trace!(event = ?watch_event, "Filtered out watch event");
                            continue;
                        }
                        if event_tx.blocking_send(watch_event).is_err() {
                            tracing::debug!("Event channel closed, dropping watch events");
                            break;
                        }
                    }
                }
                Err(error) => {
                    let _ = event_tx.blocking_send(WatchEvent::TransportError(error.to_string()));
                }
            },
            notify::Config::default(),
        )?;

        let mut tree = Self {
            watcher,
            watched: FxHashSet::default(),
            event_rx,
            root: root.clone(),
        };
        tree.register(&root)?;

        tracing::info!(root = %tree.root, "Watch tree started");
        Ok(tree)
    }

    /// Adds a directory to the watch set.
    ///
    /// Idempotent: registering an already-watched directory is a no-op
    /// reported as [`Registration::AlreadyWatched`]. A failure here (the
    /// directory vanished between detection and registration, permission
    /// denied) leaves the rest of the tree watched; callers log it and
    /// carry on.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Notify`] if the backend rejects the watch.
    pub fn register(&mut self, dir: &Utf8Path) -> Result<Registration, WatchError> {
        if self.watched.contains(dir) {
            return Ok(Registration::AlreadyWatched);
        }

        self.watcher
            .watch(dir.as_std_path(), RecursiveMode::NonRecursive)?;
        self.watched.insert(dir.to_owned());

        tracing::debug!(dir = %dir, watched = self.watched.len(), "Directory registered");
        Ok(Registration::Added)
    }

    /// Returns `true` if `dir` is in the watch set.
    #[inline]
    #[must_use]
    pub fn contains(&self, dir: &Utf8Path) -> bool {
        self.watched.contains(dir)
    }

    /// Returns the number of directories currently watched.
    #[inline]
    #[must_use]
    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Returns the canonicalized watched root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Receives the next watch event.
    ///
    /// Returns `None` once the notification backend has shut down and
    /// the channel is drained, which terminates the dispatch loop
    /// cleanly.
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.event_rx.recv().await
    }

    /// Tries to receive a watch event without waiting.
    pub fn try_recv(&mut self) -> Result<WatchEvent, mpsc::error::TryRecvError> {
        self.event_rx.try_recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::AcceptAll;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
        Utf8Path::from_path(dir.path())
            .expect("Invalid path")
            .to_owned()
    }

    /// Receives events until one matches, tolerating unrelated noise.
    async fn recv_matching<F>(tree: &mut WatchTree, mut matches: F) -> Option<WatchEvent>
    where
        F: FnMut(&WatchEvent) -> bool,
    {
        let deadline = Duration::from_secs(5);
        tokio::time::timeout(deadline, async {
            while let Some(event) = tree.recv().await {
                if matches(&event) {
                    return Some(event);
                }
            }
            None
        })
        .await
        .ok()
        .flatten()
    }

    #[tokio::test]
    async fn test_watch_tree_creation() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = utf8_root(&dir);

        let tree = WatchTree::new(&root, 100, AcceptAll).expect("Failed to create watch tree");
        assert_eq!(tree.watched_count(), 1);
        assert!(tree.contains(tree.root()));
    }

    #[tokio::test]
    async fn test_watch_tree_root_not_found() {
        let result = WatchTree::new(Utf8Path::new("/nonexistent/watch/root"), 100, AcceptAll);
        match result {
            Err(WatchError::RootNotFound(_)) => {}
            other => panic!("Expected RootNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_watch_tree_root_not_directory() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = utf8_root(&dir);
        let file = root.join("plain.txt");
        fs::write(file.as_std_path(), b"x").expect("Failed to write file");

        let result = WatchTree::new(&file, 100, AcceptAll);
        match result {
            Err(WatchError::RootNotDirectory(_)) => {}
            other => panic!("Expected RootNotDirectory, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = utf8_root(&dir);
        let sub = root.join("sub");
        fs::create_dir(sub.as_std_path()).expect("Failed to create dir");

        let mut tree = WatchTree::new(&root, 100, AcceptAll).expect("Failed to create watch tree");

        assert_eq!(
            tree.register(&sub).expect("Registration failed"),
            Registration::Added
        );
        assert_eq!(
            tree.register(&sub).expect("Registration failed"),
            Registration::AlreadyWatched
        );
        assert_eq!(tree.watched_count(), 2);
    }

    #[tokio::test]
    async fn test_receives_file_written_event() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = utf8_root(&dir);

        let mut tree = WatchTree::new(&root, 100, AcceptAll).expect("Failed to create watch tree");

        let file = tree.root().join("note.txt");
        fs::write(file.as_std_path(), b"content").expect("Failed to write file");

        let event = recv_matching(&mut tree, WatchEvent::is_file_written).await;

        // Event delivery is timing-dependent; when it arrives it must
        // carry the written path.
        if let Some(WatchEvent::FileWritten(path)) = event {
            assert!(path.as_str().ends_with("note.txt"));
        }
    }

    #[tokio::test]
    async fn test_receives_directory_created_event() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = utf8_root(&dir);

        let mut tree = WatchTree::new(&root, 100, AcceptAll).expect("Failed to create watch tree");

        let sub = tree.root().join("newdir");
        fs::create_dir(sub.as_std_path()).expect("Failed to create dir");

        let event = recv_matching(&mut tree, WatchEvent::is_directory_created).await;

        if let Some(WatchEvent::DirectoryCreated(path)) = event {
            assert!(path.as_str().ends_with("newdir"));
        }
    }

    #[tokio::test]
    async fn test_unregistered_subdirectory_not_observed() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = utf8_root(&dir);
        let sub = root.join("pre-existing");
        fs::create_dir(sub.as_std_path()).expect("Failed to create dir");

        // The subdirectory existed before the tree was created and was
        // never registered, so writes inside it are invisible.
        let mut tree = WatchTree::new(&root, 100, AcceptAll).expect("Failed to create watch tree");

        let file = tree.root().join("pre-existing").join("invisible.txt");
        fs::write(file.as_std_path(), b"content").expect("Failed to write file");

        tokio::time::sleep(Duration::from_millis(300)).await;
        let mut saw_write = false;
        while let Ok(event) = tree.try_recv() {
            if event.is_file_written() {
                saw_write = true;
            }
        }
        assert!(!saw_write);
    }
}
