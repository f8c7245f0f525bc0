//! SeaORM storage backend
//!
//! SQLite, MySQL/MariaDB and PostgreSQL through one `UrlStore`
//! implementation. Every statement runs under the configured retry policy
//! and per-attempt timeout.

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{Result, SnaplinkError};
use crate::storage::{AnalyticsPage, ClickRecord, InsertOutcome, NewUrl, UrlRecord, UrlStore};

pub use connection::{connect_generic, connect_sqlite, normalize_sqlite_url, run_migrations};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(SnaplinkError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, *.db, mysql://, mariadb://, postgres://, memory",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
    timeout_ms: u64,
}

impl SeaOrmStore {
    /// Connects, runs migrations and returns a ready store.
    pub async fn new(database_url: &str, backend_name: &str, config: &DatabaseConfig) -> Result<Self> {
        if database_url.is_empty() {
            return Err(SnaplinkError::database_config("database_url is empty"));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(&normalize_sqlite_url(database_url)).await?
        } else {
            connect_generic(database_url, backend_name, config.pool_size).await?
        };

        run_migrations(&db).await?;

        let store = Self::from_connection(db, backend_name, config);
        info!("{} storage initialized", store.backend_name.to_uppercase());
        Ok(store)
    }

    /// Wraps an already-migrated connection.
    pub fn from_connection(db: DatabaseConnection, backend_name: &str, config: &DatabaseConfig) -> Self {
        Self {
            db,
            backend_name: backend_name.to_string(),
            retry_config: retry::RetryConfig {
                max_retries: config.retry_count,
                base_delay_ms: config.retry_base_delay_ms,
                max_delay_ms: config.retry_max_delay_ms,
            },
            timeout_ms: config.timeout.max(1).saturating_mul(1000),
        }
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl UrlStore for SeaOrmStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>> {
        self.query_by_code(code).await
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<String>> {
        self.query_code_for_url(url).await
    }

    async fn code_exists(&self, code: &str) -> Result<bool> {
        self.query_code_exists(code).await
    }

    async fn insert_unique(&self, new_url: NewUrl) -> Result<InsertOutcome> {
        self.insert_if_absent(new_url).await
    }

    async fn increment_click(&self, code: &str, accessed_at: DateTime<Utc>) -> Result<()> {
        self.bump_click_count(code, accessed_at).await
    }

    async fn insert_click_record(&self, click: ClickRecord) -> Result<()> {
        self.append_click(click).await
    }

    async fn delete_by_code(&self, code: &str) -> Result<bool> {
        self.delete_with_clicks(code).await
    }

    async fn page_analytics(&self, offset: u64, limit: u64) -> Result<AnalyticsPage> {
        self.query_analytics_page(offset, limit).await
    }

    async fn count(&self) -> Result<u64> {
        self.query_count().await
    }

    fn backend_name(&self) -> &str {
        &self.backend_name
    }
}
