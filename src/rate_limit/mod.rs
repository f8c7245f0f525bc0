//! Per-client request rate limiting

mod sliding_window;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

pub use sliding_window::{RateDecision, RateLimiter, RateLimiterStats};

/// Spawns the periodic idle-client sweep. An interval of 0 disables it.
pub fn spawn_idle_sweeper(
    limiter: Arc<RateLimiter>,
    interval: Duration,
) -> Option<tokio::task::JoinHandle<()>> {
    if interval.is_zero() {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // 第一次 tick 立即返回
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep_idle();
            if removed > 0 {
                debug!("Rate limiter swept {} idle clients", removed);
            }
        }
    }))
}
