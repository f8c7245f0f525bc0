//! LookupCoordinator tests
//!
//! A counting wrapper around `MemoryStore` shows which resolves reach the
//! store and which are answered by the cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Notify;

use snaplink::cache::{BoundedLookupCache, CachedLookup};
use snaplink::errors::{Result, SnaplinkError};
use snaplink::services::LookupCoordinator;
use snaplink::storage::{
    AnalyticsPage, ClickRecord, InsertOutcome, MemoryStore, NewUrl, UrlRecord, UrlStore,
};

// =============================================================================
// Test Setup
// =============================================================================

#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    find_calls: AtomicUsize,
    down: AtomicBool,
    /// When set, `find_by_code` reads the inner store, signals `entered`
    /// and then waits for `release` before answering.
    paused: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl CountingStore {
    fn finds(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UrlStore for CountingStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(SnaplinkError::store_unavailable("database is locked"));
        }
        let answer = self.inner.find_by_code(code).await;
        if self.paused.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        answer
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<String>> {
        self.inner.find_by_url(url).await
    }

    async fn code_exists(&self, code: &str) -> Result<bool> {
        self.inner.code_exists(code).await
    }

    async fn insert_unique(&self, new_url: NewUrl) -> Result<InsertOutcome> {
        self.inner.insert_unique(new_url).await
    }

    async fn increment_click(&self, code: &str, at: DateTime<Utc>) -> Result<()> {
        self.inner.increment_click(code, at).await
    }

    async fn insert_click_record(&self, click: ClickRecord) -> Result<()> {
        self.inner.insert_click_record(click).await
    }

    async fn delete_by_code(&self, code: &str) -> Result<bool> {
        self.inner.delete_by_code(code).await
    }

    async fn page_analytics(&self, offset: u64, limit: u64) -> Result<AnalyticsPage> {
        self.inner.page_analytics(offset, limit).await
    }

    async fn count(&self) -> Result<u64> {
        self.inner.count().await
    }

    fn backend_name(&self) -> &str {
        "counting"
    }
}

fn setup(capacity: usize) -> (Arc<CountingStore>, LookupCoordinator) {
    let store = Arc::new(CountingStore::default());
    let cache = Arc::new(BoundedLookupCache::<CachedLookup>::new(capacity));
    let coordinator = LookupCoordinator::new(cache, store.clone());
    (store, coordinator)
}

fn new_url(code: &str, url: &str, expires_at: Option<DateTime<Utc>>) -> NewUrl {
    NewUrl {
        code: code.to_string(),
        url: url.to_string(),
        is_custom: true,
        expires_at,
    }
}

// =============================================================================
// Create / resolve / delete
// =============================================================================

#[tokio::test]
async fn test_create_resolve_delete() {
    let (store, lookup) = setup(100);

    let outcome = store
        .insert_unique(new_url("promo1", "https://shop.example/sale", None))
        .await
        .unwrap();
    assert_eq!(outcome, InsertOutcome::Inserted);
    lookup.record_creation("promo1", "https://shop.example/sale");

    let resolved = lookup.resolve("promo1").await.unwrap().unwrap();
    assert_eq!(resolved.url, "https://shop.example/sale");
    assert_eq!(store.finds(), 1);

    // 第二次命中缓存
    let again = lookup.resolve("promo1").await.unwrap().unwrap();
    assert_eq!(again.url, resolved.url);
    assert_eq!(store.finds(), 1);

    assert!(store.delete_by_code("promo1").await.unwrap());
    lookup.record_deletion("promo1");

    assert!(lookup.resolve("promo1").await.unwrap().is_none());
    assert_eq!(store.finds(), 2);

    // NotFound 被缓存，不再查询存储
    assert!(lookup.resolve("promo1").await.unwrap().is_none());
    assert_eq!(store.finds(), 2);
}

#[tokio::test]
async fn test_negative_cache_then_creation() {
    let (store, lookup) = setup(100);

    assert!(lookup.resolve("ghost").await.unwrap().is_none());
    assert!(lookup.resolve("ghost").await.unwrap().is_none());
    assert_eq!(store.finds(), 1);

    store
        .insert_unique(new_url("ghost", "https://example.com/boo", None))
        .await
        .unwrap();
    lookup.record_creation("ghost", "https://example.com/boo");

    let resolved = lookup.resolve("ghost").await.unwrap().unwrap();
    assert_eq!(resolved.url, "https://example.com/boo");
    assert_eq!(store.finds(), 2);
}

#[tokio::test]
async fn test_creation_during_store_read_is_not_masked() {
    let (store, lookup) = setup(100);
    let lookup = Arc::new(lookup);
    store.paused.store(true, Ordering::SeqCst);

    // 读者在创建之前读到"不存在"，并停在存储调用中
    let reader = {
        let lookup = lookup.clone();
        tokio::spawn(async move { lookup.resolve("ghost").await })
    };
    store.entered.notified().await;

    store
        .insert_unique(new_url("ghost", "https://example.com/late", None))
        .await
        .unwrap();
    lookup.record_creation("ghost", "https://example.com/late");

    store.paused.store(false, Ordering::SeqCst);
    store.release.notify_one();
    assert!(reader.await.unwrap().unwrap().is_none());

    // 过期的 NotFound 不得留在缓存里
    let resolved = lookup.resolve("ghost").await.unwrap().unwrap();
    assert_eq!(resolved.url, "https://example.com/late");
    assert_eq!(store.finds(), 2);
}

#[tokio::test]
async fn test_deletion_during_store_read_is_not_masked() {
    let (store, lookup) = setup(100);
    let lookup = Arc::new(lookup);
    store
        .insert_unique(new_url("gone", "https://example.com/gone", None))
        .await
        .unwrap();
    store.paused.store(true, Ordering::SeqCst);

    let reader = {
        let lookup = lookup.clone();
        tokio::spawn(async move { lookup.resolve("gone").await })
    };
    store.entered.notified().await;

    assert!(store.delete_by_code("gone").await.unwrap());
    lookup.record_deletion("gone");

    store.paused.store(false, Ordering::SeqCst);
    store.release.notify_one();
    assert!(reader.await.unwrap().unwrap().is_some());

    assert!(lookup.resolve("gone").await.unwrap().is_none());
    assert_eq!(store.finds(), 2);
}

#[tokio::test]
async fn test_expiry_travels_with_cached_value() {
    let (store, lookup) = setup(10);
    let past = Utc::now() - Duration::hours(1);

    store
        .insert_unique(new_url("old", "https://example.com/old", Some(past)))
        .await
        .unwrap();

    let first = lookup.resolve("old").await.unwrap().unwrap();
    assert!(first.is_expired());

    let cached = lookup.resolve("old").await.unwrap().unwrap();
    assert_eq!(cached.expires_at, Some(past));
    assert!(cached.is_expired());
    assert_eq!(store.finds(), 1);
}

// =============================================================================
// Failure handling and stats
// =============================================================================

#[tokio::test]
async fn test_store_error_is_not_cached() {
    let (store, lookup) = setup(10);
    store.down.store(true, Ordering::SeqCst);

    let err = lookup.resolve("abc").await.unwrap_err();
    assert!(matches!(err, SnaplinkError::StoreUnavailable(_)));
    assert_eq!(lookup.cache_stats().size, 0);

    store.down.store(false, Ordering::SeqCst);
    assert!(lookup.resolve("abc").await.unwrap().is_none());
    assert_eq!(store.finds(), 2);
}

#[tokio::test]
async fn test_stats_and_clear() {
    let (store, lookup) = setup(10);
    store
        .insert_unique(new_url("abc", "https://example.com", None))
        .await
        .unwrap();

    lookup.resolve("abc").await.unwrap();
    lookup.resolve("abc").await.unwrap();
    lookup.resolve("nope").await.unwrap();

    let stats = lookup.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.size, 2);

    lookup.clear_cache();
    let stats = lookup.cache_stats();
    assert_eq!(stats.size, 0);
    assert_eq!(stats.hits + stats.misses, 0);

    // 清空后重新回源
    lookup.resolve("abc").await.unwrap();
    assert_eq!(store.finds(), 3);
}

#[tokio::test]
async fn test_concurrent_resolves_agree() {
    let (store, lookup) = setup(10);
    store
        .insert_unique(new_url("shared", "https://example.com/shared", None))
        .await
        .unwrap();
    let lookup = Arc::new(lookup);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let lookup = lookup.clone();
        handles.push(tokio::spawn(async move {
            lookup.resolve("shared").await.unwrap().map(|r| r.url)
        }));
    }

    for handle in handles {
        assert_eq!(
            handle.await.unwrap().as_deref(),
            Some("https://example.com/shared")
        );
    }
    assert!(store.finds() >= 1);
    assert_eq!(lookup.cache_stats().lookups(), 16);
}
