//! Property-based tests for the sliding-window limiter

use std::time::{Duration, Instant};

use proptest::prelude::*;

use crate::rate_limit::RateLimiter;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// In any window-length interval, at most `limit` requests are admitted.
    #[test]
    fn prop_never_admits_more_than_limit_per_window(
        limit in 1usize..6,
        window_ms in 100u64..2_000,
        gaps in prop::collection::vec(0u64..400, 1..80),
    ) {
        let window = Duration::from_millis(window_ms);
        let rl = RateLimiter::new(limit, window);
        let start = Instant::now();

        let mut offset = 0u64;
        let mut admitted: Vec<u64> = Vec::new();
        for gap in gaps {
            offset += gap;
            let decision = rl.check_at("client", start + Duration::from_millis(offset));
            if decision.allowed {
                admitted.push(offset);
            } else {
                let retry = decision.retry_after_secs.unwrap_or(0);
                prop_assert!(retry >= 1);
                prop_assert!(retry <= window.as_secs() + 1);
            }

            let in_window = admitted
                .iter()
                .filter(|&&t| offset - t < window_ms)
                .count();
            prop_assert!(in_window <= limit);
        }
    }

    /// A client that waits one full window after its last request is admitted.
    #[test]
    fn prop_admitted_after_full_window(
        limit in 1usize..6,
        burst in 1usize..12,
        window_secs in 1u64..120,
    ) {
        let window = Duration::from_secs(window_secs);
        let rl = RateLimiter::new(limit, window);
        let start = Instant::now();

        for _ in 0..burst {
            rl.check_at("client", start);
        }
        prop_assert!(rl.check_at("client", start + window).allowed);
    }
}
