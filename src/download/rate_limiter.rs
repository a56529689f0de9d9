//! Fixed-interval request pacing for crawls.
//!
//! Each source adapter owns a [`RateLimiter`] built from its configured
//! request delay. Before every page fetch the adapter calls
//! [`RateLimiter::acquire`], which sleeps for the full delay. There is no
//! adaptive backoff and no jitter: the pause is the same before every request.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use harvester_core::download::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(Duration::from_millis(500));
//! limiter.acquire("https://www.zobodat.at/publikation_series.php").await;
//! # }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::constants::CUMULATIVE_DELAY_WARNING_THRESHOLD;

/// Pauses before each request of a crawl.
///
/// `Send + Sync`, so it can live inside an adapter behind `&self`.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,

    /// Total time spent sleeping, in milliseconds.
    cumulative_delay_ms: AtomicU64,

    /// Set once the cumulative warning was logged.
    warned: AtomicBool,
}

impl RateLimiter {
    /// Creates a limiter that sleeps `delay` before every request.
    #[must_use]
    #[instrument(skip_all, fields(delay_ms = delay.as_millis()))]
    pub fn new(delay: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            delay,
            cumulative_delay_ms: AtomicU64::new(0),
            warned: AtomicBool::new(false),
        }
    }

    /// Creates a limiter that never sleeps.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Whether no pause is applied.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.delay.is_zero()
    }

    /// Pause applied before each request.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Total time slept so far.
    #[must_use]
    pub fn cumulative_delay(&self) -> Duration {
        Duration::from_millis(self.cumulative_delay_ms.load(Ordering::Relaxed))
    }

    /// Sleeps for the configured delay before a request to `url`.
    #[instrument(skip(self), fields(delay_ms = self.delay.as_millis()))]
    pub async fn acquire(&self, url: &str) {
        if self.is_disabled() {
            return;
        }

        let cumulative = self.add_cumulative_delay(self.delay);
        debug!(
            cumulative_ms = cumulative.as_millis(),
            "pausing before request"
        );

        if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD
            && !self.warned.swap(true, Ordering::Relaxed)
        {
            warn!(
                cumulative_delay_secs = cumulative.as_secs(),
                "crawl has spent a long time pacing requests - consider a shorter request-delay"
            );
        }

        tokio::time::sleep(self.delay).await;
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(total)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[tokio::test]
    async fn test_disabled_limiter_never_sleeps() {
        let limiter = RateLimiter::disabled();
        assert!(limiter.is_disabled());

        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire("https://example.com/").await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(limiter.cumulative_delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_limiter_sleeps_before_every_request() {
        let limiter = RateLimiter::new(Duration::from_millis(20));

        let start = Instant::now();
        limiter.acquire("https://example.com/a").await;
        limiter.acquire("https://example.com/b").await;
        limiter.acquire("https://other.org/c").await;

        assert!(start.elapsed() >= Duration::from_millis(60));
        assert_eq!(limiter.cumulative_delay(), Duration::from_millis(60));
    }
}
