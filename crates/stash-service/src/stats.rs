//! Service counters with atomic updates.
//!
//! [`ServiceStats`] tracks what the dispatch loop has done since startup;
//! [`ServiceSnapshot`] is the point-in-time copy reported at shutdown and
//! by the one-shot sweep. Counters use relaxed ordering; they are
//! informational and need no cross-counter consistency.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for the archiving service.
#[derive(Debug, Default)]
pub struct ServiceStats {
    /// Files successfully archived.
    archived: AtomicU64,
    /// Files skipped because they were empty at processing time.
    skipped_empty: AtomicU64,
    /// Archive tasks that failed.
    failed: AtomicU64,
    /// Directories added to the watch set.
    directories: AtomicU64,
    /// Transport errors reported by the notification layer.
    transport_errors: AtomicU64,
    /// Total source bytes consumed by successful archives.
    bytes_in: AtomicU64,
    /// Total compressed bytes produced by successful archives.
    bytes_out: AtomicU64,
}

impl ServiceStats {
    /// Creates a new [`ServiceStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successful archive and its byte sizes.
    #[inline]
    pub fn record_archived(&self, source_bytes: u64, destination_bytes: u64) {
        self.archived.fetch_add(1, Ordering::Relaxed);
        self.bytes_in.fetch_add(source_bytes, Ordering::Relaxed);
        self.bytes_out.fetch_add(destination_bytes, Ordering::Relaxed);
    }

    /// Records one empty source skipped by policy.
    #[inline]
    pub fn record_skipped_empty(&self) {
        self.skipped_empty.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one failed archive task.
    #[inline]
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one directory registration.
    #[inline]
    pub fn record_directory(&self) {
        self.directories.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one transport error.
    #[inline]
    pub fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> ServiceSnapshot {
        ServiceSnapshot {
            archived: self.archived.load(Ordering::Relaxed),
            skipped_empty: self.skipped_empty.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            directories: self.directories.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`ServiceStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    /// Files successfully archived.
    pub archived: u64,
    /// Files skipped because they were empty at processing time.
    pub skipped_empty: u64,
    /// Archive tasks that failed.
    pub failed: u64,
    /// Directories added to the watch set.
    pub directories: u64,
    /// Transport errors reported by the notification layer.
    pub transport_errors: u64,
    /// Total source bytes consumed by successful archives.
    pub bytes_in: u64,
    /// Total compressed bytes produced by successful archives.
    pub bytes_out: u64,
}

impl ServiceSnapshot {
    /// Returns the overall space saving as a percentage.
    ///
    /// Zero bytes in yields the `0.0` sentinel, matching the per-file
    /// ratio policy. Negative values mean the archive grew overall.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Acceptable for statistics display
    pub fn saved_percent(&self) -> f64 {
        if self.bytes_in == 0 {
            return 0.0;
        }

        let bytes_in = self.bytes_in as f64;
        let bytes_out = self.bytes_out as f64;
        ((bytes_in - bytes_out) / bytes_in) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_start_at_zero() {
        let snap = ServiceStats::new().snapshot();
        assert_eq!(snap, ServiceSnapshot::default());
    }

    #[test]
    fn test_stats_record() {
        let stats = ServiceStats::new();
        stats.record_archived(2048, 512);
        stats.record_archived(1024, 512);
        stats.record_skipped_empty();
        stats.record_failure();
        stats.record_directory();
        stats.record_transport_error();

        let snap = stats.snapshot();
        assert_eq!(snap.archived, 2);
        assert_eq!(snap.skipped_empty, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.directories, 1);
        assert_eq!(snap.transport_errors, 1);
        assert_eq!(snap.bytes_in, 3072);
        assert_eq!(snap.bytes_out, 1024);
    }

    #[test]
    fn test_saved_percent() {
        let snap = ServiceSnapshot {
            bytes_in: 4096,
            bytes_out: 1024,
            ..Default::default()
        };
        assert!((snap.saved_percent() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_saved_percent_zero_sentinel() {
        let snap = ServiceSnapshot::default();
        let saved = snap.saved_percent();
        assert!(saved.abs() < f64::EPSILON);
        assert!(!saved.is_nan());
    }

    #[test]
    fn test_saved_percent_negative_when_grown() {
        let snap = ServiceSnapshot {
            bytes_in: 10,
            bytes_out: 40,
            ..Default::default()
        };
        assert!(snap.saved_percent() < 0.0);
    }

    #[test]
    fn test_snapshot_serialization() {
        let snap = ServiceSnapshot {
            archived: 3,
            bytes_in: 4096,
            bytes_out: 1024,
            ..Default::default()
        };
        let json = serde_json::to_string(&snap).expect("Serialization failed");
        let parsed: ServiceSnapshot = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(snap, parsed);
    }
}
