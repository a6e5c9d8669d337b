//! Path filtering for watch events.
//!
//! Filtering happens in the notification callback, before events reach
//! the channel, so uninteresting paths never cost the dispatch loop
//! anything. The service accepts everything by default; the hidden-file
//! filter exists for trees where editors drop temporary dotfiles that
//! would otherwise be archived on every save.

use camino::Utf8Path;

/// A predicate deciding which paths produce watch events.
///
/// Filters run on the notification callback thread, so implementations
/// must be [`Send`] and [`Sync`] and should be cheap.
///
/// # Examples
///
/// ```
/// use stash_watcher::PathFilter;
/// use camino::Utf8Path;
///
/// struct SkipLogs;
///
/// impl PathFilter for SkipLogs {
///     fn should_observe(&self, path: &Utf8Path) -> bool {
///         path.extension() != Some("log")
///     }
/// }
///
/// assert!(SkipLogs.should_observe(Utf8Path::new("notes.txt")));
/// assert!(!SkipLogs.should_observe(Utf8Path::new("debug.log")));
/// ```
pub trait PathFilter: Send + Sync + 'static {
    /// Returns `true` if events for `path` should reach the dispatcher.
    fn should_observe(&self, path: &Utf8Path) -> bool;
}

/// A filter that observes every path.
///
/// The default: the service archives everything placed under the watched
/// root.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl PathFilter for AcceptAll {
    #[inline]
    fn should_observe(&self, _path: &Utf8Path) -> bool {
        true
    }
}

/// A filter that ignores dotfile names.
///
/// Only the final path component is inspected. A hidden directory is
/// never registered, so its whole subtree goes unobserved; a visible
/// file inside one would only be seen if its parent were registered
/// through some other route.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipHidden;

impl PathFilter for SkipHidden {
    #[inline]
    fn should_observe(&self, path: &Utf8Path) -> bool {
        !path.file_name().is_some_and(|name| name.starts_with('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_all() {
        assert!(AcceptAll.should_observe(Utf8Path::new("anything.txt")));
        assert!(AcceptAll.should_observe(Utf8Path::new(".hidden")));
    }

    #[test]
    fn test_skip_hidden() {
        let filter = SkipHidden;
        assert!(filter.should_observe(Utf8Path::new("monitored/notes.txt")));
        assert!(!filter.should_observe(Utf8Path::new("monitored/.notes.txt.swp")));
        // Hidden parent directories do not hide the file itself
        assert!(filter.should_observe(Utf8Path::new("monitored/.cache/data.bin")));
    }
}
