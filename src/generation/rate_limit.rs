//! Minimum-interval pacing for backend calls.
//!
//! Every backend call waits its turn here. A call requested sooner than
//! `min_interval` after the previous call started is delayed, never dropped.
//! The lock is held across the sleep so concurrent callers queue up and each
//! starts at least `min_interval` after the one before it.

use std::time::Duration;

use log::debug;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a call may start, and record its start time.
    pub async fn wait_turn(&self) {
        let mut last_start = self.last_start.lock().await;
        if let Some(previous) = *last_start {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(
                    "Rate limiting backend call, waiting {}ms",
                    (ready_at - now).as_millis()
                );
                sleep_until(ready_at).await;
            }
        }
        *last_start = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn first_call_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let started = Instant::now();
        limiter.wait_turn().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn consecutive_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(40));
        limiter.wait_turn().await;
        let first = Instant::now();
        limiter.wait_turn().await;
        assert!(first.elapsed() >= Duration::from_millis(35));
    }

    #[tokio::test]
    async fn concurrent_callers_queue_up() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(30)));
        let started = Instant::now();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.wait_turn().await })
            })
            .collect();
        for handle in handles {
            handle.await.expect("join");
        }
        // three starts need two full intervals between them
        assert!(started.elapsed() >= Duration::from_millis(60));
    }
}
