//! In-process store
//!
//! Backs the `memory` backend and the test suites. Codes live in a
//! `DashMap`, so insert-if-absent is atomic per code.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;

use super::{AnalyticsPage, ClickRecord, InsertOutcome, NewUrl, UrlRecord, UrlStore};
use crate::errors::Result;

#[derive(Debug, Default)]
pub struct MemoryStore {
    urls: DashMap<String, UrlRecord>,
    clicks: Mutex<Vec<ClickRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Click rows recorded for `code`, oldest first
    pub fn clicks_for(&self, code: &str) -> Vec<ClickRecord> {
        self.clicks
            .lock()
            .iter()
            .filter(|c| c.short_code == code)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UrlStore for MemoryStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>> {
        Ok(self.urls.get(code).map(|r| r.value().clone()))
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<String>> {
        Ok(self
            .urls
            .iter()
            .filter(|r| r.original_url == url && !r.is_custom && r.expires_at.is_none())
            .min_by_key(|r| r.created_at)
            .map(|r| r.short_code.clone()))
    }

    async fn code_exists(&self, code: &str) -> Result<bool> {
        Ok(self.urls.contains_key(code))
    }

    async fn insert_unique(&self, new_url: NewUrl) -> Result<InsertOutcome> {
        match self.urls.entry(new_url.code.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(UrlRecord {
                    short_code: new_url.code,
                    original_url: new_url.url,
                    click_count: 0,
                    is_custom: new_url.is_custom,
                    expires_at: new_url.expires_at,
                    created_at: Utc::now(),
                    last_accessed_at: None,
                });
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn increment_click(&self, code: &str, accessed_at: DateTime<Utc>) -> Result<()> {
        if let Some(mut record) = self.urls.get_mut(code) {
            record.click_count += 1;
            record.last_accessed_at = Some(accessed_at);
        }
        Ok(())
    }

    async fn insert_click_record(&self, click: ClickRecord) -> Result<()> {
        self.clicks.lock().push(click);
        Ok(())
    }

    async fn delete_by_code(&self, code: &str) -> Result<bool> {
        let existed = self.urls.remove(code).is_some();
        if existed {
            self.clicks.lock().retain(|c| c.short_code != code);
        }
        Ok(existed)
    }

    async fn page_analytics(&self, offset: u64, limit: u64) -> Result<AnalyticsPage> {
        let mut rows: Vec<UrlRecord> = self.urls.iter().map(|r| r.value().clone()).collect();
        let total_count = rows.len() as u64;
        let total_clicks = rows.iter().map(|r| r.click_count).sum();

        rows.sort_by(|a, b| {
            b.click_count
                .cmp(&a.click_count)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.short_code.cmp(&b.short_code))
        });

        let rows = rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();

        Ok(AnalyticsPage {
            rows,
            total_count,
            total_clicks,
        })
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.urls.len() as u64)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_url(code: &str, url: &str) -> NewUrl {
        NewUrl {
            code: code.to_string(),
            url: url.to_string(),
            is_custom: false,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_unique_rejects_duplicates() {
        let store = MemoryStore::new();
        assert_eq!(
            store.insert_unique(new_url("abc", "https://a.example")).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            store.insert_unique(new_url("abc", "https://b.example")).await.unwrap(),
            InsertOutcome::Conflict
        );

        let record = store.find_by_code("abc").await.unwrap().unwrap();
        assert_eq!(record.original_url, "https://a.example");
    }

    #[tokio::test]
    async fn test_find_by_url_skips_custom_and_expiring() {
        let store = MemoryStore::new();
        store
            .insert_unique(NewUrl {
                is_custom: true,
                ..new_url("promo1", "https://a.example")
            })
            .await
            .unwrap();
        store
            .insert_unique(NewUrl {
                expires_at: Some(Utc::now()),
                ..new_url("tmp123", "https://a.example")
            })
            .await
            .unwrap();
        assert_eq!(store.find_by_url("https://a.example").await.unwrap(), None);

        store
            .insert_unique(new_url("gen123", "https://a.example"))
            .await
            .unwrap();
        assert_eq!(
            store.find_by_url("https://a.example").await.unwrap().as_deref(),
            Some("gen123")
        );
    }

    #[tokio::test]
    async fn test_delete_removes_clicks() {
        let store = MemoryStore::new();
        store.insert_unique(new_url("abc", "https://a.example")).await.unwrap();
        store
            .insert_click_record(ClickRecord {
                short_code: "abc".to_string(),
                clicked_at: Utc::now(),
                user_agent: None,
                ip_address: None,
                referrer: None,
            })
            .await
            .unwrap();

        assert!(store.delete_by_code("abc").await.unwrap());
        assert!(store.clicks_for("abc").is_empty());
        assert!(!store.delete_by_code("abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_page_analytics_ordering() {
        let store = MemoryStore::new();
        for code in ["aaa", "bbb", "ccc"] {
            store.insert_unique(new_url(code, "https://x.example")).await.unwrap();
        }
        let now = Utc::now();
        store.increment_click("bbb", now).await.unwrap();
        store.increment_click("bbb", now).await.unwrap();
        store.increment_click("ccc", now).await.unwrap();

        let page = store.page_analytics(0, 2).await.unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_clicks, 3);
        let codes: Vec<_> = page.rows.iter().map(|r| r.short_code.as_str()).collect();
        assert_eq!(codes, vec!["bbb", "ccc"]);

        let rest = store.page_analytics(2, 2).await.unwrap();
        assert_eq!(rest.rows.len(), 1);
        assert_eq!(rest.rows[0].short_code, "aaa");
    }
}
