use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::settings::{RateLimitSettings, RetrySettings};

/// Token bucket: holds up to `burst` tokens, refilled at `per_second`.
/// Waiting happens with the bucket locked, so callers are served in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    per_second: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl RateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        let burst = f64::from(settings.burst.max(1));
        let per_second = if settings.is_valid() {
            settings.per_second
        } else {
            let fallback = RateLimitSettings::default().per_second;
            tracing::warn!(
                "Unusable request rate {}, limiting to {} per second",
                settings.per_second,
                fallback
            );
            fallback
        };
        Self {
            per_second,
            burst,
            bucket: Mutex::new(Bucket {
                tokens: burst,
                refilled_at: Instant::now(),
            }),
        }
    }

    /// Suspends the caller until a token is available, then takes it
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        self.refill(&mut bucket);
        if bucket.tokens < 1.0 {
            let wait = Duration::from_secs_f64((1.0 - bucket.tokens) / self.per_second);
            tracing::debug!("Rate limit reached, waiting {:?}", wait);
            sleep(wait).await;
            self.refill(&mut bucket);
        }
        bucket.tokens = (bucket.tokens - 1.0).max(0.0);
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.per_second).min(self.burst);
        bucket.refilled_at = now;
    }
}

/// Bounded wait-and-retry for transient statuses
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }

    /// Delay before retry number `retry` (0-based). A server-provided hint wins,
    /// but is still capped.
    pub fn delay(&self, retry: u32, hint: Option<Duration>) -> Duration {
        let backoff = hint.unwrap_or_else(|| {
            self.base_delay
                .checked_mul(2u32.saturating_pow(retry))
                .unwrap_or(self.max_delay)
        });
        backoff.min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(per_second: f64, burst: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitSettings { per_second, burst })
    }

    #[tokio::test(start_paused = true)]
    async fn burst_is_free() {
        let limiter = limiter(2.0, 10);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn sustained_rate_after_burst() {
        let limiter = limiter(2.0, 10);
        let start = Instant::now();
        for _ in 0..14 {
            limiter.acquire().await;
        }
        // 4 requests beyond the burst at 2/s
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1990), "{:?}", elapsed);
        assert!(elapsed <= Duration::from_millis(2010), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_refills_up_to_burst() {
        let limiter = limiter(2.0, 3);
        for _ in 0..3 {
            limiter.acquire().await;
        }
        sleep(Duration::from_secs(60)).await;
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(490));
    }

    #[tokio::test(start_paused = true)]
    async fn unusable_rate_falls_back_to_default() {
        for per_second in [0.0, -3.0, f64::NAN] {
            let limiter = limiter(per_second, 1);
            let start = Instant::now();
            limiter.acquire().await;
            limiter.acquire().await;
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(490), "{:?}", elapsed);
            assert!(elapsed <= Duration::from_millis(510), "{:?}", elapsed);
        }
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let policy = RetryPolicy::new(&RetrySettings {
            max_retries: 10,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
        });
        assert_eq!(policy.delay(0, None), Duration::from_secs(1));
        assert_eq!(policy.delay(1, None), Duration::from_secs(2));
        assert_eq!(policy.delay(3, None), Duration::from_secs(8));
        assert_eq!(policy.delay(4, None), Duration::from_secs(10));
        assert_eq!(policy.delay(40, None), Duration::from_secs(10));
    }

    #[test]
    fn server_hint_takes_precedence() {
        let policy = RetryPolicy::new(&RetrySettings::default());
        assert_eq!(
            policy.delay(3, Some(Duration::from_millis(250))),
            Duration::from_millis(250)
        );
        assert_eq!(
            policy.delay(0, Some(Duration::from_secs(600))),
            Duration::from_secs(10)
        );
    }
}
