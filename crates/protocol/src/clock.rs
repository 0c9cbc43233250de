//! Monotonic time source for player uptime
//!
//! The status tracker reports uptime ("jiffies") in every STAT message.
//! Reading the clock through a narrow trait keeps the tracker deterministic
//! under test: production code injects [`SystemClock`], tests inject
//! [`ManualClock`] and advance it by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic clock the status tracker derives uptime from
pub trait MonotonicClock: Send + Sync {
    /// Time elapsed since the clock started
    fn elapsed(&self) -> Duration;
}

/// Wall clock backed by [`std::time::Instant`]
#[derive(Debug, Clone)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    /// Creates a clock that starts counting now
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Hand-driven clock for deterministic tests
///
/// Clones share the same underlying time, so a test can keep one handle
/// and hand another to a [`StatusTracker`](crate::status::StatusTracker).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use slimlink_protocol::clock::{ManualClock, MonotonicClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
///
/// handle.advance(Duration::from_millis(250));
/// assert_eq!(clock.elapsed(), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock stopped at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `delta` (millisecond resolution)
    pub fn advance(&self, delta: Duration) {
        self.millis
            .fetch_add(delta.as_millis() as u64, Ordering::SeqCst);
    }

    /// Sets the elapsed time outright
    pub fn set(&self, elapsed: Duration) {
        self.millis.store(elapsed.as_millis() as u64, Ordering::SeqCst);
    }
}

impl MonotonicClock for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}
