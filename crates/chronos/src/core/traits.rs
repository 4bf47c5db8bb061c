//! Seams for time and device discovery.

use std::sync::Arc;
use std::time::Instant;

/// Monotonic time source used for lease expiry.
///
/// Expiry arithmetic deliberately avoids the wall clock: a clock jumping
/// backwards must not extend a lease. Wall-clock strings are only recorded
/// for display and for lock-file payloads, via the platform adapter.
pub trait Clock: Send + Sync + 'static {
    /// Seconds elapsed on a monotonic timeline.
    fn now_secs(&self) -> u64;
}

impl<T: Clock> Clock for Arc<T> {
    fn now_secs(&self) -> u64 {
        (**self).now_secs()
    }
}

/// Clock backed by [`Instant`], anchored at construction.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_secs(&self) -> u64 {
        self.origin.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_starts_near_zero() {
        let clock = MonotonicClock::new();
        assert!(clock.now_secs() < 2);
    }
}
