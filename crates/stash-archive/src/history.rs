//! The append-only compression history log.
//!
//! Every successfully archived file produces exactly one timestamped line
//! in a shared log file, in the shape:
//!
//! ```text
//! 2024-01-15 10:30:00: monitored/a/b.txt (size: 0.00 KB), archived as 'archive/a_b.txt.gz' (size: 0.02 KB) compression rate: -360.0000%
//! ```
//!
//! Appends are atomic with respect to each other: a process-wide mutex
//! serializes writers, the file is opened in append-create mode for the
//! duration of one write, and the whole line goes out in a single
//! `write_all`. Parallel archive tasks can never interleave partial lines.
//!
//! Diagnostics and errors go to the tracing stream, never to this file.

use std::fs::OpenOptions;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use parking_lot::Mutex;

use stash_core::{kilobytes, CompressionRecord};

use crate::error::ArchiveError;

/// Timestamp format for history lines.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The shared append-only history log.
///
/// Cheap to share behind an `Arc`; every append acquires the internal
/// mutex, opens the file, writes one line, and releases both.
///
/// # Examples
///
/// ```no_run
/// use stash_archive::HistoryLog;
/// use stash_core::CompressionRecord;
/// use camino::Utf8PathBuf;
///
/// let log = HistoryLog::new("service_history.log");
/// let record = CompressionRecord {
///     source: Utf8PathBuf::from("monitored/a.txt"),
///     destination: Utf8PathBuf::from("archive/a.txt.gz"),
///     source_bytes: 4096,
///     destination_bytes: 1024,
/// };
/// log.append(&record)?;
/// # Ok::<(), stash_archive::ArchiveError>(())
/// ```
#[derive(Debug)]
pub struct HistoryLog {
    /// Where the log lives; created on first append.
    path: Utf8PathBuf,

    /// Serializes appends from parallel archive tasks.
    lock: Mutex<()>,
}

impl HistoryLog {
    /// Creates a handle to the history log at `path`.
    ///
    /// The file itself is not touched until the first append.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the path of the log file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Appends one record, stamped with the current local time.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::History`] if the log cannot be opened or
    /// written.
    pub fn append(&self, record: &CompressionRecord) -> Result<(), ArchiveError> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.append_at(&timestamp, record)
    }

    /// Appends one record with an explicit timestamp.
    ///
    /// Split out from [`append`](Self::append) so the line format can be
    /// tested deterministically.
    pub fn append_at(&self, timestamp: &str, record: &CompressionRecord) -> Result<(), ArchiveError> {
        let line = compose(timestamp, record);

        let _guard = self.lock.lock();
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.path.as_std_path())
            .map_err(|e| ArchiveError::History {
                path: self.path.clone(),
                source: e,
            })?;

        file.write_all(line.as_bytes()).map_err(|e| ArchiveError::History {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// Renders one newline-terminated history line.
fn compose(timestamp: &str, record: &CompressionRecord) -> String {
    format!(
        "{timestamp}: {source} (size: {source_kb:.2} KB), archived as '{destination}' (size: {destination_kb:.2} KB) compression rate: {rate:.4}%\n",
        source = record.source,
        destination = record.destination,
        source_kb = kilobytes(record.source_bytes),
        destination_kb = kilobytes(record.destination_bytes),
        rate = record.ratio_percent(),
    )
}
