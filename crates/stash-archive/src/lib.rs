//! Gzip archive writer and compression history log.
//!
//! This crate holds the two leaf stages of the archiving pipeline:
//!
//! - [`compress_file`]: read one source file, gzip it at maximum effort,
//!   and atomically place the result at its destination.
//! - [`HistoryLog`]: the shared append-only log receiving one timestamped
//!   line per archived file.
//!
//! Neither stage knows anything about filesystem watching; both are plain
//! synchronous transformations, bridged into the async service with
//! `spawn_blocking` by the caller.
//!
//! # Atomicity
//!
//! The compressed stream is written to a temporary file in the archive
//! directory and persisted to its final name only once complete. A task
//! that fails midway drops the temporary file; no truncated archive can
//! ever occupy a destination path.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod compressor;
pub mod error;
pub mod history;

pub use compressor::{compress_file, ArchiveOutcome};
pub use error::ArchiveError;
pub use history::HistoryLog;
