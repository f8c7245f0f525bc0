use chrono::{DateTime, Utc};

/// A code resolved to its destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ResolvedUrl {
    pub fn new(url: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            url: url.into(),
            expires_at,
        }
    }

    /// Expired once `now` reaches `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Value stored in the lookup cache
///
/// `NotFound` records that the store had no row for the code, which is
/// different from the code being absent from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedLookup {
    Found(ResolvedUrl),
    NotFound,
}
