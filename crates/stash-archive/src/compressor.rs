//! Single-file gzip compression.
//!
//! [`compress_file`] is the whole archive writer: read the source, gzip it
//! at maximum effort into a temporary file next to the destination, then
//! atomically persist it. It is a pure transformation with no knowledge of
//! watching or dispatch, and it is deliberately synchronous; the service
//! runs it on the blocking pool.

use std::fs;
use std::io::{self, Write};

use camino::Utf8Path;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;

use crate::error::ArchiveError;

/// The result of one archive attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// The source was compressed and persisted at the destination.
    Archived {
        /// Size of the source content that was compressed, in bytes.
        source_bytes: u64,
        /// Size of the finished compressed file, in bytes.
        destination_bytes: u64,
    },

    /// The source was empty when read; nothing was written.
    ///
    /// Zero-byte sources are skipped by policy: the write-triggered
    /// dispatch makes them rare, and a gzip file of nothing is pure
    /// header overhead.
    SkippedEmpty,
}

/// Compresses `source` into a gzip stream at `destination`.
///
/// The stream is written to a temporary file in the destination's
/// directory, synced, measured, and only then renamed into place, so a
/// concurrent reader of `destination` can never observe a partial
/// archive and a failed attempt leaves nothing behind.
///
/// The source may have been deleted or rewritten since the caller decided
/// to archive it; whatever content is readable at this moment is what
/// gets compressed. Callers wanting last-write-wins semantics serialize
/// attempts per source path.
///
/// # Errors
///
/// Any I/O failure aborts the attempt and reports which step failed; see
/// [`ArchiveError`]. The temporary file is removed on every error path.
pub fn compress_file(
    source: &Utf8Path,
    destination: &Utf8Path,
) -> Result<ArchiveOutcome, ArchiveError> {
    let content = fs::read(source.as_std_path()).map_err(|e| ArchiveError::read_source(source, e))?;

    if content.is_empty() {
        tracing::debug!(source = %source, "Source empty at processing time; skipping");
        return Ok(ArchiveOutcome::SkippedEmpty);
    }

    let archive_dir = destination.parent().ok_or_else(|| {
        ArchiveError::open_destination(destination, io::Error::other("destination has no parent directory"))
    })?;

    let mut staged = NamedTempFile::new_in(archive_dir.as_std_path())
        .map_err(|e| ArchiveError::open_destination(destination, e))?;

    let mut encoder = GzEncoder::new(&mut staged, Compression::best());
    encoder
        .write_all(&content)
        .map_err(|e| ArchiveError::write_destination(destination, e))?;
    encoder
        .finish()
        .map_err(|e| ArchiveError::write_destination(destination, e))?;

    // The stream must be durably complete before any size accounting.
    staged
        .as_file()
        .sync_all()
        .map_err(|e| ArchiveError::write_destination(destination, e))?;

    let destination_bytes = staged
        .as_file()
        .metadata()
        .map_err(|e| ArchiveError::write_destination(destination, e))?
        .len();

    staged
        .persist(destination.as_std_path())
        .map_err(|e| ArchiveError::Persist {
            path: destination.to_owned(),
            source: e.error,
        })?;

    Ok(ArchiveOutcome::Archived {
        source_bytes: content.len() as u64,
        destination_bytes,
    })
}
