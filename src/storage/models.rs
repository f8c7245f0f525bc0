use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of `urls`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub short_code: String,
    pub original_url: String,
    #[serde(default)]
    pub click_count: u64,
    #[serde(default)]
    pub is_custom: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

/// Row to insert; counters and timestamps are filled by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrl {
    pub code: String,
    pub url: String,
    pub is_custom: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of an insert-if-absent keyed by short code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another row already owns the code; nothing was written
    Conflict,
}

/// One row of `clicks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickRecord {
    pub short_code: String,
    pub clicked_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
}

/// A page of `urls` ordered by click count then creation time, both
/// descending, plus table-wide aggregates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsPage {
    pub rows: Vec<UrlRecord>,
    pub total_count: u64,
    pub total_clicks: u64,
}
