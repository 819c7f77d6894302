//! Outbound request spacing for feed calls
//!
//! Concurrent batch fetches share one limiter per feed so the provider sees
//! evenly spaced requests instead of bursts.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Default minimum delay between feed requests (100ms = max 10 req/sec)
pub const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 100;

/// Reservation-based limiter enforcing a minimum gap between requests
///
/// Each caller reserves its slot while holding the lock and sleeps after
/// releasing it, so concurrent callers always receive distinct slots.
#[derive(Debug)]
pub struct RateLimiter {
    /// Next free slot, as an offset from `epoch`
    next_slot: Mutex<Duration>,
    epoch: Instant,
    min_interval: Duration,
    name: String,
    total_requests: AtomicU64,
    delayed_requests: AtomicU64,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, name: &str) -> Self {
        Self {
            next_slot: Mutex::new(Duration::ZERO),
            epoch: Instant::now(),
            min_interval,
            name: name.to_string(),
            total_requests: AtomicU64::new(0),
            delayed_requests: AtomicU64::new(0),
        }
    }

    /// Wait until a request may be sent
    pub async fn acquire(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let now = self.epoch.elapsed();

        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = (*next).max(now);
            *next = slot + self.min_interval;
            slot
        };

        if slot > now {
            self.delayed_requests.fetch_add(1, Ordering::Relaxed);
            let target = self.epoch + slot;
            debug!(
                "[RATE_LIMITER:{}] delaying request by {:?}",
                self.name,
                slot - now
            );
            tokio::time::sleep_until(target).await;
        }
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            name: self.name.clone(),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            delayed_requests: self.delayed_requests.load(Ordering::Relaxed),
            min_interval_ms: self.min_interval.as_millis() as u64,
        }
    }
}

/// Statistics about rate limiter usage
#[derive(Debug, Clone, serde::Serialize)]
pub struct RateLimiterStats {
    pub name: String,
    pub total_requests: u64,
    pub delayed_requests: u64,
    pub min_interval_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_request_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(100), "test");

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_second_request_waits() {
        let limiter = RateLimiter::new(Duration::from_millis(100), "test");
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(90), "only waited {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(150), "waited too long: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_spaced() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(50), "concurrent"));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                start.elapsed()
            }));
        }

        let mut times = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap());
        }
        times.sort();

        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(40));
        }

        let stats = limiter.stats();
        assert_eq!(stats.total_requests, 4);
        assert!(stats.delayed_requests >= 3);
    }
}
