//! Per-file compression records.
//!
//! A [`CompressionRecord`] is produced once per successfully archived file
//! and appended to the history log. Records are write-only artifacts: the
//! service never reads them back.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// The sizes and paths of one completed archive operation.
///
/// # Examples
///
/// ```
/// use stash_core::CompressionRecord;
/// use camino::Utf8PathBuf;
///
/// let record = CompressionRecord {
///     source: Utf8PathBuf::from("monitored/a/b.txt"),
///     destination: Utf8PathBuf::from("archive/a_b.txt.gz"),
///     source_bytes: 4096,
///     destination_bytes: 1024,
/// };
/// assert!((record.ratio_percent() - 75.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionRecord {
    /// The source file that was archived.
    pub source: Utf8PathBuf,

    /// The compressed destination produced for it.
    pub destination: Utf8PathBuf,

    /// Size of the source at the moment compression began, in bytes.
    pub source_bytes: u64,

    /// Size of the finished compressed destination, in bytes.
    pub destination_bytes: u64,
}

impl CompressionRecord {
    /// Returns the percentage reduction in size from source to destination.
    ///
    /// `((source - destination) / source) * 100`. Gzip headers can exceed
    /// the savings on tiny inputs, so negative values are valid output,
    /// not errors. A zero-byte source yields the sentinel `0.0` rather
    /// than dividing by zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use stash_core::CompressionRecord;
    /// use camino::Utf8PathBuf;
    ///
    /// let tiny = CompressionRecord {
    ///     source: Utf8PathBuf::from("monitored/tiny.txt"),
    ///     destination: Utf8PathBuf::from("archive/tiny.txt.gz"),
    ///     source_bytes: 5,
    ///     destination_bytes: 25,
    /// };
    /// // gzip overhead dominates: the "compression" grew the file
    /// assert!(tiny.ratio_percent() < 0.0);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Acceptable for statistics display
    pub fn ratio_percent(&self) -> f64 {
        if self.source_bytes == 0 {
            return 0.0;
        }

        let source = self.source_bytes as f64;
        let destination = self.destination_bytes as f64;
        ((source - destination) / source) * 100.0
    }
}

/// Converts a byte count to kilobytes for display.
#[inline]
#[must_use]
#[allow(clippy::cast_precision_loss)] // Acceptable for statistics display
pub fn kilobytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}
