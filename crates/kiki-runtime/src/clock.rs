#![forbid(unsafe_code)]

//! Wall-clock time for timestamps that end up in persisted state.
//!
//! Scheduling uses the host monotonic clock from `kiki_core::clock`; this
//! trait only answers "what time is it" for `completedAt` and `lastVisited`.

use std::cell::Cell;

use chrono::{DateTime, Utc};

/// Source of UTC timestamps.
pub trait WallClock {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The system clock (`Date.now()` in the browser).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that reports a settable instant. Used by tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    /// Move the reported instant.
    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl WallClock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_reports_what_was_set() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let clock = FixedClock::new(t0);
        assert_eq!(clock.now_utc(), t0);
        clock.set(t1);
        assert_eq!(clock.now_utc(), t1);
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now_utc().timestamp() > 0);
    }
}
