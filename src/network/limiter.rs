//! Process-wide admission control for upstream requests

use crate::config::RateLimitSettings;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Something a request must pass through before it is issued
#[async_trait]
pub trait RequestGate: Send + Sync {
    /// Wait for and consume one permit. Never fails, only delays.
    async fn acquire(&self);
}

/// Token-bucket limiter: at most `permits` request starts per `period`.
///
/// Permits are spaced `period / permits` apart with a burst of one, so no
/// rolling window of length `period` ever sees more than `permits` starts.
/// Waiters are admitted in arrival order.
pub struct RateLimiter {
    governor: DefaultDirectRateLimiter,
    queue: Mutex<()>,
    permits: u32,
    period: Duration,
}

impl RateLimiter {
    pub fn new(permits: u32, period: Duration) -> Self {
        let permits = permits.max(1);
        let interval = (period / permits).max(Duration::from_nanos(1));
        // with_period only fails on a zero duration, clamped above
        let quota = Quota::with_period(interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::MIN);

        Self {
            governor: DefaultDirectRateLimiter::direct(quota),
            queue: Mutex::new(()),
            permits,
            period,
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(settings.permits, Duration::from_secs(settings.period_secs))
    }

    pub fn permits(&self) -> u32 {
        self.permits
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_settings(&RateLimitSettings::default())
    }
}

#[async_trait]
impl RequestGate for RateLimiter {
    async fn acquire(&self) {
        // tokio's Mutex is fair, which turns the governor into a FIFO queue
        let _turn = self.queue.lock().await;
        if self.governor.check().is_err() {
            debug!("Rate limit reached, waiting for a permit");
            self.governor.until_ready().await;
        }
    }
}
