//! Process-wide, content-addressed caches (`spec.md` §5, §9).
//!
//! Both the trie cache and the special-token cache are read-mostly and
//! never need to evict a *valid* entry — the cache key is derived from the
//! content it indexes, so a different key set or fingerprint simply misses
//! rather than returning something stale. This mirrors
//! `grill-core::cache`'s approach of a small dedicated cache type backed by
//! a lock, rather than a lock-free structure the spec doesn't require.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// A generic, thread-safe, content-addressed cache. `get_or_insert_with`
/// only ever computes `V` once per distinct `K`.
pub struct Cache<K, V> {
    entries: Mutex<HashMap<K, Arc<V>>>,
}

impl<K, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert_with(&self, key: K, build: impl FnOnce() -> V) -> Arc<V> {
        if let Some(hit) = self.entries.lock().unwrap().get(&key) {
            return Arc::clone(hit);
        }
        let value = Arc::new(build());
        self.entries
            .lock()
            .unwrap()
            .entry(key)
            .or_insert_with(|| Arc::clone(&value));
        value
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_once_per_key() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = AtomicUsize::new(0);
        let cache: Cache<&str, u32> = Cache::new();
        let a = cache.get_or_insert_with("x", || {
            calls.fetch_add(1, Ordering::SeqCst);
            1
        });
        let b = cache.get_or_insert_with("x", || {
            calls.fetch_add(1, Ordering::SeqCst);
            2
        });
        assert_eq!(*a, 1);
        assert_eq!(*b, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
