//! Minimum spacing between requests to one remote service.
//!
//! The [`RateLimiter`] enforces a fixed interval between consecutive
//! requests. The first request proceeds immediately; each later request waits
//! for whatever is left of the interval since the previous one.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use classyfire::classify::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(Duration::from_secs(5));
//!
//! // First request proceeds immediately
//! limiter.throttle().await;
//!
//! // Second request waits out the rest of the five seconds
//! limiter.throttle().await;
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::progress::wait_with_progress;

/// Warning threshold for cumulative throttling delay (5 minutes).
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(300);

/// Request spacing for a single remote service.
///
/// `RateLimiter` is `Send + Sync`; `throttle` holds an async mutex across
/// its wait, so concurrent callers are serialized.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum time between two requests.
    interval: Duration,

    /// Whether throttling is disabled (interval of zero).
    disabled: bool,

    /// Draw a countdown bar while waiting.
    show_progress: bool,

    /// Time of the last request. `None` until the first request.
    last_request: Mutex<Option<Instant>>,

    /// Cumulative delay applied so far (in milliseconds).
    cumulative_delay_ms: AtomicU64,
}

impl RateLimiter {
    /// Creates a rate limiter with the given interval.
    ///
    /// A zero interval yields a disabled limiter.
    #[must_use]
    #[instrument(skip_all, fields(interval_ms = interval.as_millis()))]
    pub fn new(interval: Duration) -> Self {
        if interval.is_zero() {
            return Self::disabled();
        }
        debug!("creating rate limiter");
        Self {
            interval,
            disabled: false,
            show_progress: false,
            last_request: Mutex::new(None),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Creates a limiter that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            interval: Duration::ZERO,
            disabled: true,
            show_progress: false,
            last_request: Mutex::new(None),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Draws a countdown bar during waits when `show` is true.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Returns whether throttling is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the minimum interval between requests.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the total time spent waiting so far.
    #[must_use]
    pub fn cumulative_delay(&self) -> Duration {
        Duration::from_millis(self.cumulative_delay_ms.load(Ordering::SeqCst))
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

    /// Waits until a request may be sent, then records it as sent.
    #[instrument(skip(self))]
    pub async fn throttle(&self) {
        if self.disabled {
            return;
        }

        let mut last_request_guard = self.last_request.lock().await;

        if let Some(last_request) = *last_request_guard {
            let elapsed = last_request.elapsed();

            if elapsed < self.interval {
                let delay = self.interval.saturating_sub(elapsed);
                let cumulative = self.add_cumulative_delay(delay);

                debug!(
                    delay_ms = delay.as_millis(),
                    cumulative_ms = cumulative.as_millis(),
                    "applying rate limit delay"
                );

                if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD
                    && cumulative - delay < CUMULATIVE_DELAY_WARNING_THRESHOLD
                {
                    warn!(
                        cumulative_delay_secs = cumulative.as_secs(),
                        "long cumulative wait between requests - consider a shorter sleep"
                    );
                }

                wait_with_progress(delay, "Waiting between requests", self.show_progress).await;
            }
        } else {
            debug!("first request - no delay");
        }

        *last_request_guard = Some(Instant::now());
    }
}
