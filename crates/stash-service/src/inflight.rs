//! Per-path single-flight admission for archive tasks.
//!
//! Rapid successive writes to one file would otherwise spawn overlapping
//! archive tasks for the same source: two readers of a moving file and
//! two writers renaming onto one destination. The [`InflightTable`]
//! serializes per path by coalescing: while a task is running for a path,
//! further writes just mark it dirty, and completion respawns exactly one
//! follow-up task that re-reads the file and therefore observes the
//! newest content. The latest write always wins.
//!
//! The table is plain owned state inside the dispatch loop; no locking.

use camino::{Utf8Path, Utf8PathBuf};
use stash_core::FxHashMap;

/// What the dispatcher should do with a file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// No task is running for this path; spawn one.
    Spawn,
    /// A task is already running; the event was folded into it.
    Coalesced,
}

/// Tracks which source paths have an archive task in flight.
///
/// Values are the "dirty" flag: `true` means at least one write arrived
/// while the current task was running, so a rerun is owed on completion.
///
/// # Examples
///
/// ```
/// use stash_service::inflight::{Admission, InflightTable};
/// use camino::Utf8Path;
///
/// let mut table = InflightTable::new();
/// let path = Utf8Path::new("monitored/a.txt");
///
/// assert_eq!(table.admit(path), Admission::Spawn);
/// assert_eq!(table.admit(path), Admission::Coalesced);
///
/// // Completion owes a rerun because a write was coalesced
/// assert!(table.complete(path));
/// // The rerun finishes with nothing pending
/// assert!(!table.complete(path));
/// assert!(table.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InflightTable {
    entries: FxHashMap<Utf8PathBuf, bool>,
}

impl InflightTable {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a file event for `path`.
    ///
    /// Returns [`Admission::Spawn`] and records the path as in flight if
    /// no task is running for it, or [`Admission::Coalesced`] after
    /// marking the running task dirty.
    pub fn admit(&mut self, path: &Utf8Path) -> Admission {
        if let Some(pending) = self.entries.get_mut(path) {
            *pending = true;
            return Admission::Coalesced;
        }

        self.entries.insert(path.to_owned(), false);
        Admission::Spawn
    }

    /// Records completion of the task for `path`.
    ///
    /// Returns `true` if writes were coalesced while the task ran, in
    /// which case the path stays in flight and the caller must spawn the
    /// rerun. Returns `false` (and forgets the path) otherwise.
    pub fn complete(&mut self, path: &Utf8Path) -> bool {
        match self.entries.get_mut(path) {
            Some(pending) if *pending => {
                *pending = false;
                true
            }
            Some(_) => {
                self.entries.remove(path);
                false
            }
            None => {
                tracing::debug!(path = %path, "Completion for untracked path");
                false
            }
        }
    }

    /// Drops the entry for `path` unconditionally.
    ///
    /// Used when a rerun cannot be spawned and the slot must not stay
    /// occupied forever.
    pub fn release(&mut self, path: &Utf8Path) {
        self.entries.remove(path);
    }

    /// Returns `true` if a task is in flight for `path`.
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Returns the number of paths currently in flight.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is in flight.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> &Utf8Path {
        Utf8Path::new(s)
    }

    #[test]
    fn test_first_admit_spawns() {
        let mut table = InflightTable::new();
        assert_eq!(table.admit(path("a.txt")), Admission::Spawn);
        assert!(table.contains(path("a.txt")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_second_admit_coalesces() {
        let mut table = InflightTable::new();
        table.admit(path("a.txt"));
        assert_eq!(table.admit(path("a.txt")), Admission::Coalesced);
        assert_eq!(table.admit(path("a.txt")), Admission::Coalesced);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_distinct_paths_are_independent() {
        let mut table = InflightTable::new();
        assert_eq!(table.admit(path("a.txt")), Admission::Spawn);
        assert_eq!(table.admit(path("b.txt")), Admission::Spawn);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_complete_without_pending_forgets() {
        let mut table = InflightTable::new();
        table.admit(path("a.txt"));
        assert!(!table.complete(path("a.txt")));
        assert!(table.is_empty());
    }

    #[test]
    fn test_complete_with_pending_owes_rerun() {
        let mut table = InflightTable::new();
        table.admit(path("a.txt"));
        table.admit(path("a.txt"));

        // Rerun owed; slot stays occupied for the rerun itself.
        assert!(table.complete(path("a.txt")));
        assert!(table.contains(path("a.txt")));

        // A fresh write during the rerun coalesces again
        assert_eq!(table.admit(path("a.txt")), Admission::Coalesced);
        assert!(table.complete(path("a.txt")));
        assert!(!table.complete(path("a.txt")));
        assert!(table.is_empty());
    }

    #[test]
    fn test_complete_untracked_is_noop() {
        let mut table = InflightTable::new();
        assert!(!table.complete(path("never-admitted.txt")));
    }

    #[test]
    fn test_release_drops_slot() {
        let mut table = InflightTable::new();
        table.admit(path("a.txt"));
        table.admit(path("a.txt"));
        table.release(path("a.txt"));
        assert!(table.is_empty());
    }
}
