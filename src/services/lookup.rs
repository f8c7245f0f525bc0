//! Cache-then-store resolution of short codes
//!
//! The store is the system of record. The cache holds either the resolved
//! URL or a `NotFound` marker; writers invalidate after their store write
//! commits. No cache lock is held while the store is awaited, and a store
//! read that overlapped an invalidation is returned but not cached.

use std::sync::Arc;

use tracing::trace;

use crate::cache::{BoundedLookupCache, CacheStats, CachedLookup, ResolvedUrl};
use crate::errors::Result;
use crate::storage::UrlStore;

pub struct LookupCoordinator {
    cache: Arc<BoundedLookupCache<CachedLookup>>,
    store: Arc<dyn UrlStore>,
}

impl LookupCoordinator {
    pub fn new(cache: Arc<BoundedLookupCache<CachedLookup>>, store: Arc<dyn UrlStore>) -> Self {
        Self { cache, store }
    }

    /// `Ok(None)` means the code does not exist. A cached `NotFound` answers
    /// without touching the store.
    pub async fn resolve(&self, code: &str) -> Result<Option<ResolvedUrl>> {
        match self.cache.get(code) {
            Some(CachedLookup::Found(resolved)) => {
                trace!("Lookup cache hit: {}", code);
                return Ok(Some(resolved));
            }
            Some(CachedLookup::NotFound) => {
                trace!("Lookup cache negative hit: {}", code);
                return Ok(None);
            }
            None => {}
        }

        // 回源期间若有写入方失效缓存，则丢弃本次读到的结果
        let epoch = self.cache.epoch();
        let (answer, entry) = match self.store.find_by_code(code).await? {
            Some(record) => {
                let resolved = ResolvedUrl::new(record.original_url, record.expires_at);
                (Some(resolved.clone()), CachedLookup::Found(resolved))
            }
            None => (None, CachedLookup::NotFound),
        };

        if !self.cache.set_if_unchanged(code, epoch, entry) {
            trace!("Skipped caching {}: invalidated during store read", code);
        }
        Ok(answer)
    }

    /// Call after the store has committed a new row for `code`.
    pub fn record_creation(&self, code: &str, url: &str) {
        if self.cache.invalidate(code) {
            trace!("Invalidated cached lookup for new code {} -> {}", code, url);
        }
    }

    /// Call after the store has committed the deletion of `code`.
    pub fn record_deletion(&self, code: &str) {
        if self.cache.invalidate(code) {
            trace!("Invalidated cached lookup for deleted code {}", code);
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
