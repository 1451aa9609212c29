//! Minimum-interval rate limiting for outbound provider calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Enforces a minimum interval between permitted calls.
///
/// The lock is held while waiting, so concurrent callers queue up and
/// the interval holds across all of them, not per caller.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until `interval` has passed since the previous permitted
    /// call, then record this call.
    pub async fn wait_if_needed(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let ready_at = previous + self.interval;
            if Instant::now() < ready_at {
                sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter.wait_if_needed().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_calls_are_spaced_by_interval() {
        let interval = Duration::from_millis(1000);
        let limiter = RateLimiter::new(interval);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.wait_if_needed().await;
        }

        assert!(start.elapsed() >= interval * 4);
        assert!(start.elapsed() < interval * 5);
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_once_interval_has_passed() {
        let limiter = RateLimiter::new(Duration::from_millis(200));
        limiter.wait_if_needed().await;
        tokio::time::advance(Duration::from_millis(500)).await;

        let start = Instant::now();
        limiter.wait_if_needed().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_the_interval() {
        let interval = Duration::from_millis(200);
        let limiter = Arc::new(RateLimiter::new(interval));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.wait_if_needed().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(start.elapsed() >= interval * 3);
    }
}
