use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use tracing::trace;

use crate::config::RateLimitConfig;
use crate::ProviderId;

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token bucket shared by every caller of one provider family.
///
/// Cloning is cheap and clones share the same bucket. The bucket refills on a
/// monotonic clock and its state is a single atomic cell, so waiting callers do
/// not queue anywhere: each one re-checks after the delay it was told to wait.
/// Dropping an `acquire()` future before it resolves consumes nothing.
#[derive(Clone)]
pub struct RateLimiter {
    provider_id: ProviderId,
    config: RateLimitConfig,
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl RateLimiter {
    pub fn new(provider_id: ProviderId, config: RateLimitConfig) -> Self {
        let limiter = config
            .enabled
            .then(|| Arc::new(GovernorRateLimiter::direct(quota_from_config(&config))));
        Self {
            provider_id,
            config,
            limiter,
        }
    }

    pub fn for_provider(provider_id: ProviderId) -> Self {
        Self::new(provider_id, RateLimitConfig::default_for(provider_id))
    }

    /// Suspends until a token is available. Never fails.
    pub async fn acquire(&self) {
        let Some(limiter) = &self.limiter else {
            return;
        };
        if limiter.check().is_ok() {
            return;
        }
        trace!(provider = %self.provider_id, "rate limit reached, waiting for token");
        limiter.until_ready().await;
    }

    /// Takes a token if one is available right now.
    pub fn try_acquire(&self) -> bool {
        self.limiter
            .as_ref()
            .map_or(true, |limiter| limiter.check().is_ok())
    }

    pub const fn provider_id(&self) -> ProviderId {
        self.provider_id
    }

    pub const fn config(&self) -> RateLimitConfig {
        self.config
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("provider_id", &self.provider_id)
            .field("config", &self.config)
            .finish()
    }
}

fn quota_from_config(config: &RateLimitConfig) -> Quota {
    let refill = NonZeroU32::new(config.refill_rate).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(config.capacity).unwrap_or(NonZeroU32::MIN);
    Quota::per_second(refill).allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn limiter(capacity: u32, refill_rate: u32) -> RateLimiter {
        RateLimiter::new(
            ProviderId::Krx,
            RateLimitConfig::new(capacity, refill_rate).expect("valid config"),
        )
    }

    #[tokio::test]
    async fn burst_up_to_capacity_is_immediate() {
        let limiter = limiter(3, 1);
        let started = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert!(started.elapsed() < Duration::from_millis(200));
        assert!(!limiter.try_acquire(), "bucket should be empty");
    }

    #[tokio::test]
    async fn acquire_waits_for_refill_once_bucket_is_empty() {
        let limiter = limiter(2, 20);
        limiter.acquire().await;
        limiter.acquire().await;

        let started = Instant::now();
        limiter.acquire().await;
        let waited = started.elapsed();

        assert!(waited >= Duration::from_millis(30), "waited only {waited:?}");
        assert!(waited < Duration::from_secs(1), "waited {waited:?}");
    }

    #[tokio::test]
    async fn clones_share_one_bucket_across_tasks() {
        let limiter = limiter(5, 50);
        let started = Instant::now();

        let handles = (0..10)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.await.expect("task should complete");
        }

        // five tokens are immediate, the other five need 20ms each
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn cancelled_wait_does_not_consume_a_token() {
        let limiter = limiter(1, 10);
        limiter.acquire().await;

        let cancelled = tokio::time::timeout(Duration::from_millis(5), limiter.acquire()).await;
        assert!(cancelled.is_err(), "second acquire should still be waiting");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(limiter.try_acquire(), "refilled token should still be available");
    }

    #[tokio::test]
    async fn disabled_limiter_never_waits() {
        let limiter = RateLimiter::new(ProviderId::Naver, RateLimitConfig::disabled());
        let started = Instant::now();

        for _ in 0..1_000 {
            limiter.acquire().await;
        }

        assert!(limiter.try_acquire());
        assert!(started.elapsed() < Duration::from_millis(200));
    }
}
