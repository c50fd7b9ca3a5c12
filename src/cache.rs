//! Keyed TTL cache for per-symbol analysis results

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// A cached value with the time it was computed
#[derive(Debug, Clone)]
pub struct Cached<V> {
    pub value: V,
    pub computed_at: DateTime<Utc>,
}

/// Symbol-keyed store with expiry on read and bounded size.
///
/// When full, inserting a new key evicts the oldest entry. A newer result
/// for a key always overwrites the older one.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: DashMap<String, Cached<V>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Fresh value for `key`, evicting it if expired
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<Cached<V>> {
        {
            let entry = self.entries.get(key)?;
            if now - entry.computed_at <= self.ttl {
                return Some(entry.clone());
            }
        }
        self.entries.remove(key);
        None
    }

    pub fn insert(&self, key: &str, value: V, computed_at: DateTime<Utc>) {
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }
        self.entries
            .insert(key.to_string(), Cached { value, computed_at });
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now - entry.computed_at <= self.ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.computed_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}
