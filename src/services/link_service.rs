//! Link management service
//!
//! Composes the code generator, lookup coordinator and rate limiter with the
//! store for the HTTP handlers: shorten, redirect with click recording,
//! info, delete and analytics.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{BoundedLookupCache, CacheStats};
use crate::config::StaticConfig;
use crate::errors::{Result, SnaplinkError};
use crate::rate_limit::{RateLimiter, RateLimiterStats};
use crate::storage::{ClickRecord, InsertOutcome, NewUrl, UrlRecord, UrlStore};
use crate::utils::time_parser::parse_expire_time;
use crate::utils::url_validator::validate_url;

use super::{CodeGenerator, LookupCoordinator};

/// Fresh draws allowed when a generated code loses an insert race
const GENERATED_INSERT_RETRIES: usize = 5;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

// ============ Request/Response DTOs ============

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
    #[serde(default)]
    pub custom_code: Option<String>,
    /// RFC3339, naive ISO (UTC) or relative like "1d2h"
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShortenResult {
    pub short_code: String,
    pub short_url: String,
    /// `false` when an existing code for the same URL was reused
    #[serde(skip)]
    pub created: bool,
}

/// Request metadata stored with each click
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UrlInfo {
    pub short_code: String,
    pub original_url: String,
    pub short_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UrlAnalyticsSummary {
    pub short_code: String,
    pub click_count: u64,
    pub last_click: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UrlAnalytics {
    pub short_code: String,
    pub original_url: String,
    pub short_url: String,
    pub click_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_custom: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsListing {
    pub total_urls: u64,
    pub total_clicks: u64,
    pub average_clicks: f64,
    pub urls: Vec<UrlAnalytics>,
    pub page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub backend: String,
    pub total_urls: u64,
    pub cache_size: usize,
}

// ============ Service ============

pub struct LinkService {
    store: Arc<dyn UrlStore>,
    lookup: Arc<LookupCoordinator>,
    generator: Arc<CodeGenerator>,
    limiter: Arc<RateLimiter>,
    base_url: String,
}

impl LinkService {
    pub fn new(
        store: Arc<dyn UrlStore>,
        lookup: Arc<LookupCoordinator>,
        generator: Arc<CodeGenerator>,
        limiter: Arc<RateLimiter>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            lookup,
            generator,
            limiter,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Wires fresh core components around `store` from `config`.
    pub fn from_config(store: Arc<dyn UrlStore>, config: &StaticConfig) -> Self {
        let cache = Arc::new(BoundedLookupCache::new(config.cache.max_capacity));
        let lookup = Arc::new(LookupCoordinator::new(cache, store.clone()));
        let generator = Arc::new(CodeGenerator::new(
            store.clone(),
            config.shortener.code_length,
            config.shortener.max_attempts,
        ));
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit.requests,
            Duration::from_secs(config.rate_limit.window_secs),
        ));
        Self::new(store, lookup, generator, limiter, config.base_url())
    }

    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }

    pub fn lookup(&self) -> Arc<LookupCoordinator> {
        self.lookup.clone()
    }

    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    pub async fn shorten(&self, request: ShortenRequest) -> Result<ShortenResult> {
        let url = validate_url(&request.url)?;

        let expires_at = match request.expires_at.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let parsed = parse_expire_time(raw)?;
                if parsed <= Utc::now() {
                    return Err(SnaplinkError::invalid_format(
                        "expires_at must be in the future",
                    ));
                }
                Some(parsed)
            }
            _ => None,
        };

        let custom_code = request
            .custom_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        // 仅普通、无过期的链接复用已有短码
        if custom_code.is_none()
            && expires_at.is_none()
            && let Some(existing) = self.store.find_by_url(&url).await?
        {
            return Ok(ShortenResult {
                short_url: self.short_url(&existing),
                short_code: existing,
                created: false,
            });
        }

        let code = match custom_code {
            Some(code) => self.insert_custom(code, &url, expires_at).await?,
            None => self.insert_generated(&url, expires_at).await?,
        };

        self.lookup.record_creation(&code, &url);
        info!("Shortened {} -> {}", code, url);

        Ok(ShortenResult {
            short_url: self.short_url(&code),
            short_code: code,
            created: true,
        })
    }

    async fn insert_custom(
        &self,
        code: &str,
        url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<String> {
        CodeGenerator::validate_custom(code)?;

        let taken = || SnaplinkError::conflict(format!("Custom code '{}' is already taken", code));
        if self.store.code_exists(code).await? {
            return Err(taken());
        }

        let new_url = NewUrl {
            code: code.to_string(),
            url: url.to_string(),
            is_custom: true,
            expires_at,
        };
        match self.insert_or_reconcile(new_url).await? {
            InsertOutcome::Inserted => Ok(code.to_string()),
            InsertOutcome::Conflict => Err(taken()),
        }
    }

    /// A store retry after a timed-out but committed insert reports our own
    /// row as a conflict. Treat a row carrying the same target as ours.
    async fn insert_or_reconcile(&self, new_url: NewUrl) -> Result<InsertOutcome> {
        let code = new_url.code.clone();
        let url = new_url.url.clone();
        let is_custom = new_url.is_custom;

        match self.store.insert_unique(new_url).await? {
            InsertOutcome::Inserted => Ok(InsertOutcome::Inserted),
            InsertOutcome::Conflict => match self.store.find_by_code(&code).await? {
                Some(existing)
                    if existing.original_url == url && existing.is_custom == is_custom =>
                {
                    debug!("Insert of {} already committed, keeping it", code);
                    Ok(InsertOutcome::Inserted)
                }
                _ => Ok(InsertOutcome::Conflict),
            },
        }
    }

    async fn insert_generated(&self, url: &str, expires_at: Option<DateTime<Utc>>) -> Result<String> {
        for _ in 0..GENERATED_INSERT_RETRIES {
            let code = self.generator.generate_unique().await?;
            let new_url = NewUrl {
                code: code.clone(),
                url: url.to_string(),
                is_custom: false,
                expires_at,
            };
            match self.insert_or_reconcile(new_url).await? {
                InsertOutcome::Inserted => return Ok(code),
                InsertOutcome::Conflict => {
                    warn!("Generated code {} was taken concurrently, redrawing", code);
                }
            }
        }

        Err(SnaplinkError::keyspace_exhausted(format!(
            "Generated codes kept colliding after {} inserts",
            GENERATED_INSERT_RETRIES
        )))
    }

    /// Resolves `code` for a redirect and records the click.
    ///
    /// Click-recording failures are logged and do not fail the redirect.
    pub async fn redirect(&self, code: &str, context: ClickContext) -> Result<String> {
        let resolved = self
            .lookup
            .resolve(code)
            .await?
            .ok_or_else(|| SnaplinkError::not_found(format!("Short code '{}' not found", code)))?;

        let now = Utc::now();
        if resolved.is_expired_at(now) {
            return Err(SnaplinkError::expired("This short link has expired"));
        }

        if let Err(e) = self.store.increment_click(code, now).await {
            warn!("Failed to update click count for {}: {}", code, e);
        }

        let click = ClickRecord {
            short_code: code.to_string(),
            clicked_at: now,
            user_agent: context.user_agent,
            ip_address: context.ip,
            referrer: context.referrer,
        };
        if let Err(e) = self.store.insert_click_record(click).await {
            warn!("Failed to record click for {}: {}", code, e);
        }

        Ok(resolved.url)
    }

    pub async fn info(&self, code: &str) -> Result<UrlInfo> {
        let resolved = self
            .lookup
            .resolve(code)
            .await?
            .ok_or_else(|| SnaplinkError::not_found(format!("Short code '{}' not found", code)))?;

        Ok(UrlInfo {
            short_code: code.to_string(),
            original_url: resolved.url,
            short_url: self.short_url(code),
        })
    }

    /// Deletes the link and its clicks, then drops the cached lookup.
    ///
    /// The cache is invalidated even when the store reports nothing was
    /// removed: a retried delete may have committed on an earlier attempt.
    pub async fn delete(&self, code: &str) -> Result<()> {
        let removed = self.store.delete_by_code(code).await?;
        self.lookup.record_deletion(code);

        if !removed {
            return Err(SnaplinkError::not_found(format!(
                "Short code '{}' not found",
                code
            )));
        }

        info!("Deleted short code: {}", code);
        Ok(())
    }

    /// Counters are read from the store, never the cache.
    pub async fn analytics(&self, code: &str) -> Result<UrlAnalyticsSummary> {
        let record = self
            .store
            .find_by_code(code)
            .await?
            .ok_or_else(|| SnaplinkError::not_found(format!("Short code '{}' not found", code)))?;

        Ok(UrlAnalyticsSummary {
            short_code: record.short_code,
            click_count: record.click_count,
            last_click: record.last_accessed_at,
        })
    }

    /// `page` starts at 1; `limit` is clamped to 1..=100.
    pub async fn analytics_page(&self, page: u64, limit: u64) -> Result<AnalyticsListing> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(limit);

        let data = self.store.page_analytics(offset, limit).await?;

        let total_pages = data.total_count.div_ceil(limit);
        let average_clicks = if data.total_count > 0 {
            data.total_clicks as f64 / data.total_count as f64
        } else {
            0.0
        };

        Ok(AnalyticsListing {
            total_urls: data.total_count,
            total_clicks: data.total_clicks,
            average_clicks,
            urls: data.rows.into_iter().map(|r| self.to_analytics(r)).collect(),
            page,
            total_pages,
        })
    }

    fn to_analytics(&self, record: UrlRecord) -> UrlAnalytics {
        UrlAnalytics {
            short_url: self.short_url(&record.short_code),
            short_code: record.short_code,
            original_url: record.original_url,
            click_count: record.click_count,
            created_at: record.created_at,
            last_accessed_at: record.last_accessed_at,
            expires_at: record.expires_at,
            is_custom: record.is_custom,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.lookup.cache_stats()
    }

    pub fn clear_cache(&self) {
        self.lookup.clear_cache();
        info!("Lookup cache cleared");
    }

    pub fn rate_limit_stats(&self) -> RateLimiterStats {
        self.limiter.stats()
    }

    pub async fn health(&self) -> Result<HealthReport> {
        let total_urls = self.store.count().await?;
        Ok(HealthReport {
            status: "healthy",
            backend: self.store.backend_name().to_string(),
            total_urls,
            cache_size: self.lookup.cache_stats().size,
        })
    }
}
