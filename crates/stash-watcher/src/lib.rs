//! Recursive directory watching with async event streaming.
//!
//! This crate detects filesystem changes via the `notify` crate and
//! delivers them to the dispatch loop as one ordered stream of tagged
//! [`WatchEvent`]s: directory creations, file writes, and transport
//! errors. Recursion is built from per-directory registrations owned by
//! [`WatchTree`] rather than delegated to the backend, so the watch set
//! stays an explicit, single-writer structure.
//!
//! # Event policy
//!
//! Archiving triggers strictly on file *writes*; file creation events are
//! dropped because they fire before content exists. Directory creation is
//! the registration trigger. Deletions and renames are out of scope and
//! dropped at classification.
//!
//! # Usage
//!
//! ```no_run
//! use stash_watcher::{AcceptAll, WatchEvent, WatchTree};
//! use camino::Utf8Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), stash_watcher::WatchError> {
//!     let mut tree = WatchTree::new(Utf8Path::new("monitored"), 100, AcceptAll)?;
//!
//!     while let Some(event) = tree.recv().await {
//!         match event {
//!             WatchEvent::DirectoryCreated(dir) => {
//!                 tree.register(&dir)?;
//!             }
//!             WatchEvent::FileWritten(path) => println!("written: {path}"),
//!             WatchEvent::TransportError(message) => eprintln!("transport: {message}"),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod filter;
pub mod watcher;

// Re-export error types
pub use error::WatchError;

// Re-export event types
pub use events::{from_notify, WatchEvent};

// Re-export filter types
pub use filter::{AcceptAll, PathFilter, SkipHidden};

// Re-export watcher types
pub use watcher::{Registration, WatchTree};
