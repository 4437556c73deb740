//! Per-carrier request throttling
//!
//! Token-bucket limiter shared by the poller's workers. Each carrier gets
//! its own bucket so a burst of Estes lookups cannot starve XPO, and the
//! bucket refills continuously rather than on a fixed window boundary.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Throttle settings applied to every carrier.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Maximum requests per `time_window`.
    pub max_requests: u32,
    /// Window the request budget is spread over.
    pub time_window: Duration,
    /// Burst capacity of each bucket.
    pub burst_size: u32,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, time_window: Duration) -> Self {
        Self {
            max_requests,
            time_window,
            burst_size: max_requests.min(10),
        }
    }

    fn refill_rate(&self) -> f64 {
        self.max_requests as f64 / self.time_window.as_secs_f64().max(f64::EPSILON)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // 60 lookups per minute per carrier, bursts of 10.
        Self::new(60, Duration::from_secs(60))
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            tokens: capacity as f64,
            capacity: capacity as f64,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate)
        }
    }
}

/// Per-carrier token-bucket limiter.
#[derive(Debug)]
pub struct CarrierRateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl CarrierRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Sleep until the carrier's bucket has a token, then consume it.
    pub async fn wait_for_permit(&self, carrier: &str) {
        loop {
            let wait = {
                let mut buckets = self.buckets.lock().unwrap();
                let bucket = buckets
                    .entry(carrier.to_ascii_lowercase())
                    .or_insert_with(|| {
                        TokenBucket::new(self.config.burst_size, self.config.refill_rate())
                    });
                if bucket.try_consume() {
                    return;
                }
                bucket.time_until_available()
            };
            tracing::debug!(carrier, wait_ms = wait.as_millis() as u64, "throttling carrier lookup");
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_consumes_then_refuses() {
        let mut bucket = TokenBucket::new(2, 1.0);
        assert!(bucket.try_consume());
        assert!(bucket.try_consume());
        assert!(!bucket.try_consume());
        let wait = bucket.time_until_available();
        assert!(wait > Duration::ZERO && wait <= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_carriers_have_independent_buckets() {
        let limiter = CarrierRateLimiter::new(RateLimitConfig::new(1, Duration::from_secs(60)));
        let start = Instant::now();
        limiter.wait_for_permit("estes").await;
        limiter.wait_for_permit("xpo").await;
        // Neither permit should have required a refill wait.
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_same_carrier_waits_for_refill() {
        let limiter = CarrierRateLimiter::new(RateLimitConfig::new(1, Duration::from_secs(1)));
        limiter.wait_for_permit("estes").await;
        let start = Instant::now();
        limiter.wait_for_permit("ESTES").await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
