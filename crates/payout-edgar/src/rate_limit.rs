//! Process-wide request throttle.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::trace;

/// Enforces a minimum interval between outbound requests.
///
/// One limiter is shared (via `Arc`) by every fetcher that talks to the same
/// source. The watermark lock is held across the wait, so concurrent callers
/// queue up and are released one interval apart.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing one request per `min_interval`.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Creates a limiter that never waits. Intended for tests.
    #[must_use]
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured minimum interval.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the next request may be sent, then advances the watermark.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let delay = self.min_interval - elapsed;
                trace!(delay_ms = delay.as_millis() as u64, "Throttling request");
                sleep(delay).await;
            }
        }
        *last = Some(Instant::now());
    }
}
