use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point-in-time snapshot of a `BoundedLookupCache`
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// `hits / (hits + misses)`, 0 when nothing has been looked up
    pub hit_rate: f64,
    pub timestamp: DateTime<Utc>,
}

impl CacheStats {
    pub(crate) fn new(
        size: usize,
        capacity: usize,
        hits: u64,
        misses: u64,
        evictions: u64,
    ) -> Self {
        Self {
            size,
            capacity,
            hits,
            misses,
            evictions,
            hit_rate: hit_rate(hits, misses),
            timestamp: Utc::now(),
        }
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
