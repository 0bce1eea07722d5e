//! Bounded LRU cache for pipeline results.
//!
//! Keyed by a SHA-256 fingerprint of the normalized request, so identical
//! inputs short-circuit the provider entirely. The cache is process-local
//! and lost on restart; capacity is small because entries are whole
//! generated documents.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the given parts joined with `::`.
pub fn fingerprint(parts: &[&str]) -> String {
    let joined = parts.join("::");
    Sha256::digest(joined.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

struct CacheInner<V> {
    capacity: usize,
    entries: HashMap<String, V>,
    /// Recency order, least recent first.
    order: VecDeque<String>,
}

/// Thread-safe LRU cache of cloneable values.
///
/// `get` refreshes recency; `insert` evicts the least recently used entry
/// once capacity is exceeded. A zero capacity disables caching entirely.
pub struct ResponseCache<V: Clone> {
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                capacity,
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().ok()?;
        if !inner.entries.contains_key(key) {
            return None;
        }
        if let Some(pos) = inner.order.iter().position(|k| k == key) {
            inner.order.remove(pos);
        }
        inner.order.push_back(key.to_string());
        inner.entries.get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: V) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if inner.capacity == 0 {
            return;
        }
        if inner.entries.insert(key.to_string(), value).is_some() {
            if let Some(pos) = inner.order.iter().position(|k| k == key) {
                inner.order.remove(pos);
            }
        }
        inner.order.push_back(key.to_string());
        while inner.entries.len() > inner.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_input_sensitive() {
        let a = fingerprint(&["SOAP", "payload", "contexto"]);
        let b = fingerprint(&["SOAP", "payload", "contexto"]);
        let c = fingerprint(&["SOAP", "payload", "outro"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn insert_then_get() {
        let cache: ResponseCache<String> = ResponseCache::new(4);
        cache.insert("k1", "v1".to_string());
        assert_eq!(cache.get("k1"), Some("v1".to_string()));
        assert_eq!(cache.get("k2"), None);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache: ResponseCache<u32> = ResponseCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        // Touch "a" so "b" becomes the eviction candidate.
        cache.get("a");
        cache.insert("c", 3);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinsert_updates_value_without_growth() {
        let cache: ResponseCache<u32> = ResponseCache::new(2);
        cache.insert("a", 1);
        cache.insert("a", 9);
        assert_eq!(cache.get("a"), Some(9));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_capacity_disables_cache() {
        let cache: ResponseCache<u32> = ResponseCache::new(0);
        cache.insert("a", 1);
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }
}
