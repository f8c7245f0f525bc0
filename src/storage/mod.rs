//! Durable storage for short links and click records
//!
//! `UrlStore` is the boundary the core talks to. Two implementations ship:
//! `SeaOrmStore` (SQLite / MySQL / PostgreSQL) and `MemoryStore`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod memory;
pub mod models;

pub use backend::SeaOrmStore;
pub use memory::MemoryStore;
pub use models::{AnalyticsPage, ClickRecord, InsertOutcome, NewUrl, UrlRecord};

/// Store failures surface as `SnaplinkError::StoreUnavailable`.
#[async_trait]
pub trait UrlStore: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>>;

    /// A reusable code for `url`: generated, without expiry
    async fn find_by_url(&self, url: &str) -> Result<Option<String>>;

    async fn code_exists(&self, code: &str) -> Result<bool>;

    /// Inserts unless the code is taken; never overwrites.
    async fn insert_unique(&self, new_url: NewUrl) -> Result<InsertOutcome>;

    /// Bumps `click_count` and sets `last_accessed_at`.
    async fn increment_click(&self, code: &str, accessed_at: DateTime<Utc>) -> Result<()>;

    async fn insert_click_record(&self, click: ClickRecord) -> Result<()>;

    /// Deletes the link and its click rows. `false` when no link existed.
    async fn delete_by_code(&self, code: &str) -> Result<bool>;

    async fn page_analytics(&self, offset: u64, limit: u64) -> Result<AnalyticsPage>;

    async fn count(&self) -> Result<u64>;

    fn backend_name(&self) -> &str;
}

/// Value of `database_url` that selects the in-memory store
pub const MEMORY_BACKEND: &str = "memory";

pub struct StoreFactory;

impl StoreFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<dyn UrlStore>> {
        let database_url = config.database_url.trim();

        if database_url == MEMORY_BACKEND {
            info!("Using in-memory store; links are lost on restart");
            return Ok(Arc::new(MemoryStore::new()));
        }

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;
        let store = SeaOrmStore::new(database_url, &backend_type, config).await?;
        Ok(Arc::new(store))
    }
}
