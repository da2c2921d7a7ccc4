//! Fast hash map and hash set type aliases.
//!
//! Lookup tables in this workspace (category map, path deduplication during
//! patching) are keyed by short strings, where the Fx hash from `rustc-hash`
//! outperforms the standard `SipHash`. None of the keys come from untrusted
//! input, so denial-of-service resistance is not needed.
//!
//! # Examples
//!
//! ```
//! use tk_core::{FxHashMap, fx_hash_map};
//!
//! let mut categories: FxHashMap<String, String> = fx_hash_map();
//! categories.insert("resistor".to_owned(), "bipoles".to_owned());
//! assert_eq!(categories.get("resistor").map(String::as_str), Some("bipoles"));
//! ```

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// Creates a new empty [`FxHashMap`].
#[inline]
#[must_use]
pub fn fx_hash_map<K, V>() -> FxHashMap<K, V> {
    FxHashMap::default()
}

/// Creates a new empty [`FxHashSet`].
///
/// # Examples
///
/// ```
/// use tk_core::fx_hash_set;
///
/// let mut seen: tk_core::FxHashSet<&str> = fx_hash_set();
/// assert!(seen.insert("src/libs/circuittikz/resistor.js"));
/// assert!(!seen.insert("src/libs/circuittikz/resistor.js"));
/// ```
#[inline]
#[must_use]
pub fn fx_hash_set<V>() -> FxHashSet<V> {
    FxHashSet::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fx_hash_map_lookup() {
        let mut map: FxHashMap<&str, &str> = fx_hash_map();
        map.insert("ground", "symbols");
        map.insert("vsource", "sources");
        assert_eq!(map.get("ground"), Some(&"symbols"));
        assert_eq!(map.get("opamp"), None);
    }

    #[test]
    fn test_fx_hash_set_dedup() {
        let mut set: FxHashSet<String> = fx_hash_set();
        set.insert("a.js".to_owned());
        set.insert("a.js".to_owned());
        assert_eq!(set.len(), 1);
    }
}
