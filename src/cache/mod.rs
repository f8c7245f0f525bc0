//! In-process lookup cache
//!
//! `BoundedLookupCache` is a strict LRU with hit/miss accounting.
//! `CachedLookup` is the value type used for short-code resolution,
//! including the negative `NotFound` marker.

mod bounded;
mod entry;
mod stats;


pub use bounded::BoundedLookupCache;
pub use entry::{CachedLookup, ResolvedUrl};
pub use stats::CacheStats;
