//! Flat rate limiting between publish attempts
//!
//! Registries throttle bursts of uploads. The throttle sleeps a fixed
//! interval before every live publish attempt except the first, measured
//! from the moment it is asked, so a slow upload still gets the full pause
//! afterwards. It never adapts and never retries.

use std::time::Duration;
use tokio::time::sleep;

/// Fixed-interval gate for successive publish calls
///
/// # Examples
///
/// ```
/// use plugin_publisher::core::PublishThrottle;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut throttle = PublishThrottle::new(Duration::from_millis(0));
/// throttle.wait_turn().await; // first attempt never waits
/// throttle.wait_turn().await;
/// # }
/// ```
#[derive(Debug)]
pub struct PublishThrottle {
    interval: Duration,
    attempts: usize,
}

impl PublishThrottle {
    /// Create a throttle with the given interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            attempts: 0,
        }
    }

    /// Configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of attempts let through so far
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Sleep the full interval unless this is the first attempt, then count
    /// the attempt
    ///
    /// Call this right before the publish it guards, after the previous
    /// publish has returned.
    pub async fn wait_turn(&mut self) {
        if self.attempts > 0 && !self.interval.is_zero() {
            tracing::debug!(wait_ms = self.interval.as_millis() as u64, "rate limit pause");
            sleep(self.interval).await;
        }
        self.attempts += 1;
    }
}
