#![forbid(unsafe_code)]

//! Explicit session cache for loaded documents.

use std::collections::HashMap;
use std::hash::Hash;

/// Key-value cache owned by a loader. Entries live until cleared.
#[derive(Debug, Clone)]
pub struct ContentCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> Default for ContentCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Clone> ContentCache<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cloned entry for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
    }

    #[must_use]
    pub fn has(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Store `value`, returning whatever it replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_clear() {
        let mut cache: ContentCache<u32, &str> = ContentCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.insert(1, "a"), None);
        assert_eq!(cache.insert(1, "b"), Some("a"));
        assert!(cache.has(&1));
        assert_eq!(cache.get(&1), Some("b"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(!cache.has(&1));
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn remove_single_entry() {
        let mut cache: ContentCache<u32, u8> = ContentCache::new();
        cache.insert(1, 1);
        cache.insert(2, 2);
        assert_eq!(cache.remove(&1), Some(1));
        assert_eq!(cache.len(), 1);
    }
}
