//! Tree scanning for registration and reconciliation.
//!
//! A directory can receive entries before its creation event makes it
//! into the watch set; those early entries produce no events. The fix is
//! an explicit scan of the directory's current contents right after
//! registration: every directory found is registered too, and every file
//! found is dispatched as a synthetic write. The same scan seeds the
//! watch set from the live tree at startup.
//!
//! Scanning never fails as a whole. An unreadable entry is logged and
//! skipped; that is degraded coverage, the same posture as a failed
//! registration.

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;

/// Directories and files currently present under a root.
///
/// The root itself is not included in `directories`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TreeScan {
    /// Every directory below the root, parents before children.
    pub directories: Vec<Utf8PathBuf>,

    /// Every file below the root.
    pub files: Vec<Utf8PathBuf>,
}

impl TreeScan {
    /// Returns `true` if the scan found nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

/// Walks the tree under `root` and collects directories and files.
///
/// Standard filters are off: hidden entries and ignore files have no
/// meaning here, everything under the watched root is coverage. Symlinks
/// are not followed.
#[must_use]
pub fn scan_tree(root: &Utf8Path) -> TreeScan {
    let mut scan = TreeScan::default();

    let walker = WalkBuilder::new(root.as_std_path())
        .standard_filters(false)
        .follow_links(false)
        .build();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(root = %root, %error, "Skipping unreadable entry during scan");
                continue;
            }
        };

        // depth 0 is the root itself
        if entry.depth() == 0 {
            continue;
        }

        let Some(path) = Utf8Path::from_path(entry.path()) else {
            tracing::warn!(
                path = %entry.path().display(),
                "Skipping non-UTF-8 path during scan"
            );
            continue;
        };

        match entry.file_type() {
            Some(file_type) if file_type.is_dir() => scan.directories.push(path.to_owned()),
            Some(file_type) if file_type.is_file() => scan.files.push(path.to_owned()),
            _ => {}
        }
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
        Utf8Path::from_path(dir.path())
            .expect("Invalid path")
            .to_owned()
    }

    #[test]
    fn test_scan_empty_tree() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let scan = scan_tree(&utf8_root(&dir));
        assert!(scan.is_empty());
    }

    #[test]
    fn test_scan_collects_files_and_directories() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = utf8_root(&dir);
        fs::create_dir_all(root.join("a/b").as_std_path()).expect("Failed to create dirs");
        fs::write(root.join("top.txt").as_std_path(), b"x").expect("Failed to write");
        fs::write(root.join("a/mid.txt").as_std_path(), b"y").expect("Failed to write");
        fs::write(root.join("a/b/leaf.txt").as_std_path(), b"z").expect("Failed to write");

        let scan = scan_tree(&root);

        assert_eq!(scan.directories.len(), 2);
        assert_eq!(scan.files.len(), 3);
        assert!(scan.directories.contains(&root.join("a")));
        assert!(scan.directories.contains(&root.join("a/b")));
        assert!(scan.files.contains(&root.join("a/b/leaf.txt")));
    }

    #[test]
    fn test_scan_parents_before_children() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = utf8_root(&dir);
        fs::create_dir_all(root.join("outer/inner").as_std_path()).expect("Failed to create dirs");

        let scan = scan_tree(&root);

        let outer = scan
            .directories
            .iter()
            .position(|d| d == &root.join("outer"))
            .expect("outer not found");
        let inner = scan
            .directories
            .iter()
            .position(|d| d == &root.join("outer/inner"))
            .expect("inner not found");
        assert!(outer < inner, "parents must come before children");
    }

    #[test]
    fn test_scan_sees_hidden_entries() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = utf8_root(&dir);
        fs::write(root.join(".hidden").as_std_path(), b"x").expect("Failed to write");
        fs::create_dir(root.join(".git").as_std_path()).expect("Failed to create dir");

        let scan = scan_tree(&root);

        assert!(scan.files.contains(&root.join(".hidden")));
        assert!(scan.directories.contains(&root.join(".git")));
    }

    #[test]
    fn test_scan_missing_root_is_empty_not_panic() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = utf8_root(&dir).join("never-created");
        let scan = scan_tree(&root);
        assert!(scan.is_empty());
    }
}
