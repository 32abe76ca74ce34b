use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

use crate::coordination::ShutdownToken;
use crate::error::{HardcourtError, Result};

/// Fixed-interval limiter: one permit per `interval`.
///
/// The lock is held while waiting, so concurrent callers are spaced out one
/// after another instead of all waking on the same deadline.
pub struct RateLimiter {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next permit, or fail with `Cancelled` if `token` fires first
    pub async fn acquire(&self, token: &ShutdownToken) -> Result<()> {
        if token.is_cancelled() {
            return Err(HardcourtError::Cancelled);
        }

        let mut last = tokio::select! {
            guard = self.last.lock() => guard,
            _ = token.cancelled() => return Err(HardcourtError::Cancelled),
        };

        if let Some(prev) = *last {
            let ready_at = prev + self.interval;
            if Instant::now() < ready_at {
                trace!(wait_ms = (ready_at - Instant::now()).as_millis() as u64, "rate limited");
                tokio::select! {
                    _ = sleep_until(ready_at) => {}
                    _ = token.cancelled() => return Err(HardcourtError::Cancelled),
                }
            }
        }

        *last = Some(Instant::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::Shutdown;

    #[tokio::test(start_paused = true)]
    async fn test_first_permit_is_immediate() {
        let shutdown = Shutdown::new();
        let limiter = RateLimiter::new(Duration::from_secs(2));

        let start = Instant::now();
        limiter.acquire(&shutdown.token()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_permit_waits_remaining_interval() {
        let shutdown = Shutdown::new();
        let token = shutdown.token();
        let limiter = RateLimiter::new(Duration::from_secs(2));

        limiter.acquire(&token).await.unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;

        let start = Instant::now();
        limiter.acquire(&token).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_cancellable() {
        let shutdown = Shutdown::new();
        let token = shutdown.token();
        let limiter = RateLimiter::new(Duration::from_secs(60));
        limiter.acquire(&token).await.unwrap();

        shutdown.request_shutdown();
        let err = limiter.acquire(&token).await.unwrap_err();
        assert!(matches!(err, HardcourtError::Cancelled));
    }
}
