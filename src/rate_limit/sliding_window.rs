//! Sliding-window log rate limiter
//!
//! Each client keeps the instants of its admitted requests inside the
//! trailing window. A request is admitted while fewer than `limit`
//! timestamps remain after dropping those at least one window old.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

/// Outcome of a single admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Whole seconds until the oldest counted request leaves the window
    pub retry_after_secs: Option<u64>,
    pub limit: usize,
    pub remaining: usize,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterStats {
    pub limit: usize,
    pub window_secs: u64,
    pub active_clients: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    clients: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// A limit of 0 is treated as 1.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, client_key: &str) -> RateDecision {
        self.check_at(client_key, Instant::now())
    }

    /// Admission check against an explicit clock reading.
    pub fn check_at(&self, client_key: &str, now: Instant) -> RateDecision {
        let mut clients = self.clients.lock();
        let window = self.window;

        let log = clients.entry(client_key.to_string()).or_default();

        while log
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= window)
        {
            log.pop_front();
        }

        if log.len() >= self.limit {
            // 最早的请求离开窗口后才能放行
            let oldest = log.front().copied().unwrap_or(now);
            let elapsed = now.saturating_duration_since(oldest);
            let retry_after = window.saturating_sub(elapsed).as_secs() + 1;
            debug!(
                "Rate limit exceeded for {}: {} requests in window, retry after {}s",
                client_key,
                log.len(),
                retry_after
            );
            return RateDecision {
                allowed: false,
                retry_after_secs: Some(retry_after),
                limit: self.limit,
                remaining: 0,
                window_secs: window.as_secs(),
            };
        }

        log.push_back(now);
        RateDecision {
            allowed: true,
            retry_after_secs: None,
            limit: self.limit,
            remaining: self.limit - log.len(),
            window_secs: window.as_secs(),
        }
    }

    /// Number of clients currently holding a request log
    pub fn tracked_clients(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn sweep_idle(&self) -> usize {
        self.sweep_idle_at(Instant::now())
    }

    /// Drops clients whose most recent request has left the window.
    /// Returns how many were removed.
    pub fn sweep_idle_at(&self, now: Instant) -> usize {
        let window = self.window;
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|_, log| {
            log.back()
                .is_some_and(|&t| now.saturating_duration_since(t) < window)
        });
        before - clients.len()
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            limit: self.limit,
            window_secs: self.window.as_secs(),
            active_clients: self.tracked_clients(),
            timestamp: Utc::now(),
        }
    }
}
