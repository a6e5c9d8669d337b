//! Source-to-archive path mapping.
//!
//! This module provides [`PathMapper`], the deterministic mapping from a
//! path under the watched root to its destination inside the archive root.
//! The mapping flattens the source's directory hierarchy into a single
//! filename: the root prefix is stripped, every path separator becomes an
//! underscore, and the `.gz` suffix is appended.
//!
//! ```text
//! monitored/reports/2024/q3.csv  ->  archive/reports_2024_q3.csv.gz
//! ```
//!
//! # Injectivity
//!
//! Naive separator substitution is not injective: `a_b/c.txt` and
//! `a/b_c.txt` would both flatten to `a_b_c.txt`. To keep the mapping
//! collision-free, each path component is escaped before joining: `%`
//! becomes `%25` and `_` becomes `%5F`. Escaped components contain no
//! literal underscore, so the separator underscores are unambiguous and
//! the original path can always be recovered. Paths free of `%` and `_`
//! map exactly as the plain substitution scheme would.

use camino::{Utf8Path, Utf8PathBuf};

/// Suffix appended to every archived file.
pub const ARCHIVE_SUFFIX: &str = ".gz";

/// The separator substitute in flattened names.
const DELIMITER: char = '_';

/// Errors produced when a source path cannot be mapped.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The source path is not located under the watched root.
    #[error("source path '{path}' is outside the watched root '{root}'")]
    OutsideRoot {
        /// The offending source path.
        path: Utf8PathBuf,
        /// The watched root the mapper was built with.
        root: Utf8PathBuf,
    },

    /// The source path has no components relative to the watched root.
    ///
    /// This happens only if the watched root itself is handed to the
    /// mapper, which no dispatch path should do.
    #[error("source path '{0}' has no relative components")]
    EmptyRelativePath(Utf8PathBuf),
}

/// Deterministic, injective mapping from watched sources to archive
/// destinations.
///
/// Owned by no pipeline stage; the archive writer uses it to derive
/// destinations and the history log records the paths it produced.
///
/// # Examples
///
/// ```
/// use stash_core::PathMapper;
/// use camino::Utf8Path;
///
/// let mapper = PathMapper::new("monitored", "archive");
/// let dest = mapper.destination(Utf8Path::new("monitored/a/b.txt")).unwrap();
/// assert_eq!(dest, "archive/a_b.txt.gz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapper {
    /// The watched root that source paths are made relative to.
    monitored_root: Utf8PathBuf,
    /// The archive root destinations are placed under.
    archive_root: Utf8PathBuf,
}

impl PathMapper {
    /// Creates a mapper for the given watched root and archive root.
    ///
    /// Both paths must be in the same form (absolute or relative) as the
    /// source paths later handed to [`destination`](Self::destination);
    /// the service canonicalizes all three at startup.
    #[must_use]
    pub fn new(monitored_root: impl Into<Utf8PathBuf>, archive_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            monitored_root: monitored_root.into(),
            archive_root: archive_root.into(),
        }
    }

    /// Returns the watched root this mapper strips from sources.
    #[inline]
    #[must_use]
    pub fn monitored_root(&self) -> &Utf8Path {
        &self.monitored_root
    }

    /// Returns the archive root destinations are placed under.
    #[inline]
    #[must_use]
    pub fn archive_root(&self) -> &Utf8Path {
        &self.archive_root
    }

    /// Computes the archive destination for a source path.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::OutsideRoot`] if `source` is not under the
    /// watched root, and [`MapError::EmptyRelativePath`] if it *is* the
    /// watched root.
    ///
    /// # Examples
    ///
    /// ```
    /// use stash_core::PathMapper;
    /// use camino::Utf8Path;
    ///
    /// let mapper = PathMapper::new("monitored", "archive");
    ///
    /// // Nested paths flatten into a single filename
    /// let dest = mapper.destination(Utf8Path::new("monitored/x/y/z.log")).unwrap();
    /// assert_eq!(dest, "archive/x_y_z.log.gz");
    ///
    /// // Paths outside the root are rejected
    /// assert!(mapper.destination(Utf8Path::new("elsewhere/z.log")).is_err());
    /// ```
    pub fn destination(&self, source: &Utf8Path) -> Result<Utf8PathBuf, MapError> {
        let relative = source
            .strip_prefix(&self.monitored_root)
            .map_err(|_| MapError::OutsideRoot {
                path: source.to_owned(),
                root: self.monitored_root.clone(),
            })?;

        let flattened = flatten(relative);
        if flattened.is_empty() {
            return Err(MapError::EmptyRelativePath(source.to_owned()));
        }

        Ok(self.archive_root.join(flattened + ARCHIVE_SUFFIX))
    }
}

/// Flattens a relative path into a single delimiter-separated filename.
fn flatten(relative: &Utf8Path) -> String {
    let mut out = String::with_capacity(relative.as_str().len());
    for component in relative.components() {
        if !out.is_empty() {
            out.push(DELIMITER);
        }
        escape_component(component.as_str(), &mut out);
    }
    out
}

/// Escapes the delimiter inside one path component.
///
/// `%` must be escaped first conceptually; here both substitutions happen
/// in a single pass so the order cannot matter.
fn escape_component(component: &str, out: &mut String) {
    for ch in component.chars() {
        match ch {
            '%' => out.push_str("%25"),
            DELIMITER => out.push_str("%5F"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> PathMapper {
        PathMapper::new("monitored", "archive")
    }

    #[test]
    fn test_destination_single_component() {
        let dest = mapper().destination(Utf8Path::new("monitored/notes.txt")).unwrap();
        assert_eq!(dest, "archive/notes.txt.gz");
    }

    #[test]
    fn test_destination_nested() {
        let dest = mapper().destination(Utf8Path::new("monitored/a/b.txt")).unwrap();
        assert_eq!(dest, "archive/a_b.txt.gz");

        let deep = mapper()
            .destination(Utf8Path::new("monitored/reports/2024/q3.csv"))
            .unwrap();
        assert_eq!(deep, "archive/reports_2024_q3.csv.gz");
    }

    #[test]
    fn test_destination_outside_root() {
        let result = mapper().destination(Utf8Path::new("elsewhere/a.txt"));
        assert!(matches!(result, Err(MapError::OutsideRoot { .. })));
    }

    #[test]
    fn test_destination_root_itself() {
        let result = mapper().destination(Utf8Path::new("monitored"));
        assert!(matches!(result, Err(MapError::EmptyRelativePath(_))));
    }

    #[test]
    fn test_underscore_collision_avoided() {
        // These two sources would collide under naive substitution.
        let first = mapper().destination(Utf8Path::new("monitored/a_b/c.txt")).unwrap();
        let second = mapper().destination(Utf8Path::new("monitored/a/b_c.txt")).unwrap();

        assert_eq!(first, "archive/a%5Fb_c.txt.gz");
        assert_eq!(second, "archive/a_b%5Fc.txt.gz");
        assert_ne!(first, second);
    }

    #[test]
    fn test_percent_escaped() {
        let dest = mapper().destination(Utf8Path::new("monitored/100%_done.txt")).unwrap();
        assert_eq!(dest, "archive/100%25%5Fdone.txt.gz");
    }

    #[test]
    fn test_injective_over_tricky_pairs() {
        let pairs = [
            ("monitored/a_b/c.txt", "monitored/a/b_c.txt"),
            ("monitored/a_/b.txt", "monitored/a/_b.txt"),
            ("monitored/x__y/z.txt", "monitored/x/_y_z.txt"),
            ("monitored/p%5Fq.txt", "monitored/p_q.txt"),
        ];
        for (left, right) in pairs {
            let a = mapper().destination(Utf8Path::new(left)).unwrap();
            let b = mapper().destination(Utf8Path::new(right)).unwrap();
            assert_ne!(a, b, "{left} and {right} must not collide");
        }
    }

    #[test]
    fn test_absolute_roots() {
        let mapper = PathMapper::new("/srv/monitored", "/srv/archive");
        let dest = mapper
            .destination(Utf8Path::new("/srv/monitored/logs/app.log"))
            .unwrap();
        assert_eq!(dest, "/srv/archive/logs_app.log.gz");
    }

    #[test]
    fn test_accessors() {
        let mapper = mapper();
        assert_eq!(mapper.monitored_root(), "monitored");
        assert_eq!(mapper.archive_root(), "archive");
    }
}
