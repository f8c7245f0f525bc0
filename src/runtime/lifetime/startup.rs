use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cache::BoundedLookupCache;
use crate::config::StaticConfig;
use crate::rate_limit::RateLimiter;
use crate::services::{CodeGenerator, LinkService, LookupCoordinator};
use crate::storage::{StoreFactory, UrlStore};

/// Components shared by every worker, each built exactly once
pub struct StartupContext {
    pub store: Arc<dyn UrlStore>,
    pub limiter: Arc<RateLimiter>,
    pub link_service: Arc<LinkService>,
}

/// Wires store, cache, limiter and services from `config`.
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = Instant::now();
    debug!("Starting pre-startup processing...");

    let store = StoreFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", store.backend_name());

    let cache = Arc::new(BoundedLookupCache::new(config.cache.max_capacity));
    debug!("Lookup cache capacity: {}", cache.capacity());

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit.requests,
        Duration::from_secs(config.rate_limit.window_secs),
    ));
    info!(
        "Rate limit: {} requests per {}s",
        limiter.limit(),
        config.rate_limit.window_secs
    );

    let lookup = Arc::new(LookupCoordinator::new(cache, store.clone()));
    let generator = Arc::new(CodeGenerator::new(
        store.clone(),
        config.shortener.code_length,
        config.shortener.max_attempts,
    ));

    let link_service = Arc::new(LinkService::new(
        store.clone(),
        lookup,
        generator,
        limiter.clone(),
        config.base_url(),
    ));

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        store,
        limiter,
        link_service,
    })
}
