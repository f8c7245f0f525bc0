//! Thread-safe bounded LRU cache with hit/miss accounting
//!
//! Entries and counters share one mutex, so `clear` and `stats` observe and
//! modify them together. Every `invalidate` and `clear` bumps an epoch;
//! `set_if_unchanged` refuses to populate when the epoch moved since the
//! caller read it, so a value read from the store before a concurrent
//! write cannot land after that write's invalidation.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use super::stats::CacheStats;

#[derive(Debug)]
struct Inner<V> {
    entries: LruCache<String, V>,
    epoch: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V> Inner<V> {
    fn insert(&mut self, key: String, value: V) {
        // push 在键已存在时返回旧值，只有不同的键才算淘汰
        if let Some((evicted, _)) = self.entries.push(key.clone(), value)
            && evicted != key
        {
            self.evictions += 1;
            trace!("Lookup cache evicted: {}", evicted);
        }
    }
}

#[derive(Debug)]
pub struct BoundedLookupCache<V> {
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> BoundedLookupCache<V> {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                epoch: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    /// Returns a copy of the value and marks it most recently used.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        match inner.entries.get(key).cloned() {
            Some(value) => {
                inner.hits += 1;
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.inner.lock().insert(key.into(), value);
    }

    /// Current invalidation epoch. Read it before fetching a value from the
    /// backing store and hand it to `set_if_unchanged`.
    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    /// Stores `value` only if no invalidate or clear happened since `epoch`
    /// was read. Returns whether the value was stored.
    pub fn set_if_unchanged(&self, key: impl Into<String>, epoch: u64, value: V) -> bool {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return false;
        }
        inner.insert(key.into(), value);
        true
    }

    /// Removes `key` if present. Counters are untouched.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        inner.epoch = inner.epoch.wrapping_add(1);
        inner.entries.pop(key).is_some()
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.epoch = inner.epoch.wrapping_add(1);
        inner.hits = 0;
        inner.misses = 0;
        inner.evictions = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats::new(
            inner.entries.len(),
            inner.entries.cap().get(),
            inner.hits,
            inner.misses,
            inner.evictions,
        )
    }

    pub fn size(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().entries.cap().get()
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().entries.iter().map(|(k, _)| k.clone()).collect()
    }
}
