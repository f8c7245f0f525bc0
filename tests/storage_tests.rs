//! SeaORM storage integration tests
//!
//! Every test gets its own SQLite file in a temporary directory.

use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tempfile::TempDir;

use migration::entities::click;
use snaplink::config::DatabaseConfig;
use snaplink::storage::backend::infer_backend_from_url;
use snaplink::storage::{
    ClickRecord, InsertOutcome, MEMORY_BACKEND, NewUrl, SeaOrmStore, StoreFactory, UrlStore,
};

// =============================================================================
// Test Setup
// =============================================================================

async fn create_store() -> (SeaOrmStore, TempDir) {
    let temp_dir = TempDir::new().expect("创建临时目录失败");
    let db_path = temp_dir.path().join("storage_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let store = SeaOrmStore::new(&db_url, "sqlite", &DatabaseConfig::default())
        .await
        .expect("创建存储失败");
    (store, temp_dir)
}

fn new_url(code: &str, url: &str) -> NewUrl {
    NewUrl {
        code: code.to_string(),
        url: url.to_string(),
        is_custom: false,
        expires_at: None,
    }
}

fn click_for(code: &str) -> ClickRecord {
    ClickRecord {
        short_code: code.to_string(),
        clicked_at: Utc::now(),
        user_agent: Some("curl/8.0".to_string()),
        ip_address: Some("198.51.100.1".to_string()),
        referrer: None,
    }
}

// =============================================================================
// insert / find
// =============================================================================

#[tokio::test]
async fn test_insert_unique_and_conflict() {
    let (store, _dir) = create_store().await;

    let first = store
        .insert_unique(new_url("abc123", "https://example.com/1"))
        .await
        .unwrap();
    assert_eq!(first, InsertOutcome::Inserted);

    let second = store
        .insert_unique(new_url("abc123", "https://example.com/2"))
        .await
        .unwrap();
    assert_eq!(second, InsertOutcome::Conflict);

    // 冲突不覆盖原记录
    let record = store.find_by_code("abc123").await.unwrap().unwrap();
    assert_eq!(record.original_url, "https://example.com/1");
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_find_by_code_roundtrips_fields() {
    let (store, _dir) = create_store().await;
    let expires_at = Utc::now() + Duration::days(1);

    store
        .insert_unique(NewUrl {
            code: "promo".to_string(),
            url: "https://example.com/promo".to_string(),
            is_custom: true,
            expires_at: Some(expires_at),
        })
        .await
        .unwrap();

    let record = store.find_by_code("promo").await.unwrap().unwrap();
    assert_eq!(record.short_code, "promo");
    assert!(record.is_custom);
    assert_eq!(record.click_count, 0);
    assert!(record.last_accessed_at.is_none());
    let stored = record.expires_at.unwrap();
    assert!((stored - expires_at).num_seconds().abs() <= 1);

    assert!(store.find_by_code("nothing").await.unwrap().is_none());
    assert!(store.code_exists("promo").await.unwrap());
    assert!(!store.code_exists("nothing").await.unwrap());
}

#[tokio::test]
async fn test_find_by_url_only_reuses_plain_links() {
    let (store, _dir) = create_store().await;
    let url = "https://example.com/shared";

    store
        .insert_unique(NewUrl {
            code: "custom1".to_string(),
            url: url.to_string(),
            is_custom: true,
            expires_at: None,
        })
        .await
        .unwrap();
    store
        .insert_unique(NewUrl {
            code: "expiring".to_string(),
            url: url.to_string(),
            is_custom: false,
            expires_at: Some(Utc::now() + Duration::hours(2)),
        })
        .await
        .unwrap();
    assert!(store.find_by_url(url).await.unwrap().is_none());

    store.insert_unique(new_url("plain1", url)).await.unwrap();
    assert_eq!(store.find_by_url(url).await.unwrap().as_deref(), Some("plain1"));
}

// =============================================================================
// clicks / delete
// =============================================================================

#[tokio::test]
async fn test_increment_click() {
    let (store, _dir) = create_store().await;
    store.insert_unique(new_url("hits", "https://example.com")).await.unwrap();

    let now = Utc::now();
    for _ in 0..3 {
        store.increment_click("hits", now).await.unwrap();
    }
    // 未知短码静默忽略
    store.increment_click("ghost", now).await.unwrap();

    let record = store.find_by_code("hits").await.unwrap().unwrap();
    assert_eq!(record.click_count, 3);
    let accessed = record.last_accessed_at.unwrap();
    assert!((accessed - now).num_seconds().abs() <= 1);
}

#[tokio::test]
async fn test_delete_removes_clicks() {
    let (store, _dir) = create_store().await;
    store.insert_unique(new_url("gone", "https://example.com/a")).await.unwrap();
    store.insert_unique(new_url("kept", "https://example.com/b")).await.unwrap();
    store.insert_click_record(click_for("gone")).await.unwrap();
    store.insert_click_record(click_for("gone")).await.unwrap();
    store.insert_click_record(click_for("kept")).await.unwrap();

    assert!(store.delete_by_code("gone").await.unwrap());
    assert!(!store.delete_by_code("gone").await.unwrap());

    let db = store.get_db();
    let gone_clicks = click::Entity::find()
        .filter(click::Column::ShortCode.eq("gone"))
        .count(db)
        .await
        .unwrap();
    let kept_clicks = click::Entity::find()
        .filter(click::Column::ShortCode.eq("kept"))
        .count(db)
        .await
        .unwrap();
    assert_eq!(gone_clicks, 0);
    assert_eq!(kept_clicks, 1);
    assert!(store.find_by_code("gone").await.unwrap().is_none());
}

// =============================================================================
// analytics
// =============================================================================

#[tokio::test]
async fn test_page_analytics() {
    let (store, _dir) = create_store().await;

    let empty = store.page_analytics(0, 10).await.unwrap();
    assert_eq!(empty.total_count, 0);
    assert_eq!(empty.total_clicks, 0);
    assert!(empty.rows.is_empty());

    let now = Utc::now();
    for (code, clicks) in [("a", 2), ("b", 7), ("c", 0), ("d", 4)] {
        store
            .insert_unique(new_url(code, &format!("https://example.com/{}", code)))
            .await
            .unwrap();
        for _ in 0..clicks {
            store.increment_click(code, now).await.unwrap();
        }
    }

    let page = store.page_analytics(0, 2).await.unwrap();
    assert_eq!(page.total_count, 4);
    assert_eq!(page.total_clicks, 13);
    let codes: Vec<&str> = page.rows.iter().map(|r| r.short_code.as_str()).collect();
    assert_eq!(codes, vec!["b", "d"]);

    let page = store.page_analytics(2, 2).await.unwrap();
    let codes: Vec<&str> = page.rows.iter().map(|r| r.short_code.as_str()).collect();
    assert_eq!(codes, vec!["a", "c"]);
}

// =============================================================================
// factory
// =============================================================================

#[tokio::test]
async fn test_factory_backends() {
    let memory = StoreFactory::create(&DatabaseConfig {
        database_url: MEMORY_BACKEND.to_string(),
        ..Default::default()
    })
    .await
    .unwrap();
    assert_eq!(memory.backend_name(), "memory");

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("factory.db");
    let sqlite = StoreFactory::create(&DatabaseConfig {
        database_url: path.display().to_string(),
        ..Default::default()
    })
    .await
    .unwrap();
    assert_eq!(sqlite.backend_name(), "sqlite");
    assert_eq!(sqlite.count().await.unwrap(), 0);
}

#[test]
fn test_infer_backend() {
    assert_eq!(infer_backend_from_url("urls.db").unwrap(), "sqlite");
    assert_eq!(infer_backend_from_url("sqlite://x.db").unwrap(), "sqlite");
    assert_eq!(infer_backend_from_url("mysql://u@h/db").unwrap(), "mysql");
    assert_eq!(infer_backend_from_url("postgres://u@h/db").unwrap(), "postgres");
    assert!(infer_backend_from_url("redis://localhost").is_err());
}
