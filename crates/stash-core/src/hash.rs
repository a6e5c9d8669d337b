//! Fast hash map and hash set type aliases.
//!
//! Type aliases for [`FxHashMap`] and [`FxHashSet`] from the `rustc-hash`
//! crate. The Fx hash algorithm is roughly 2x faster than the standard
//! library's default hasher for the path-string keys this workspace uses
//! (the watch set and the in-flight archive table). Denial-of-service
//! resistance is not needed for purely internal tables.

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// The hasher used by [`FxHashMap`] and [`FxHashSet`].
pub type FxBuildHasher = rustc_hash::FxBuildHasher;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fx_hash_map_operations() {
        let mut map: FxHashMap<&str, u64> = FxHashMap::default();
        map.insert("monitored/a.txt", 1);
        map.insert("monitored/b.txt", 2);
        assert_eq!(map.get("monitored/a.txt"), Some(&1));
        assert_eq!(map.get("monitored/c.txt"), None);
    }

    #[test]
    fn test_fx_hash_set_operations() {
        let mut set: FxHashSet<&str> = FxHashSet::default();
        set.insert("monitored");
        set.insert("monitored/sub");
        assert!(set.contains("monitored"));
        assert!(!set.contains("archive"));
    }
}
