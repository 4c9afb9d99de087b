#![forbid(unsafe_code)]

//! Host-controlled monotonic time.
//!
//! The app core never reads the system clock for scheduling. The host owns
//! time and advances it explicitly, which keeps timer-driven behaviour
//! (delayed speech, quiz auto-advance) reproducible in tests.

use core::time::Duration;
use std::cell::Cell;
use std::rc::Rc;

/// Source of monotonic time.
pub trait MonotonicClock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now_mono(&self) -> Duration;
}

/// Host clock shared by handle.
///
/// Clones observe the same instant, so the step runner can advance time while
/// components that only read it (the mascot's speech expiry) keep a handle.
#[derive(Debug, Default, Clone)]
pub struct SharedClock {
    now: Rc<Cell<Duration>>,
}

impl SharedClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set current monotonic time. Moving backwards is ignored.
    pub fn set(&self, now: Duration) {
        if now > self.now.get() {
            self.now.set(now);
        }
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get().saturating_add(dt));
    }
}

impl MonotonicClock for SharedClock {
    fn now_mono(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates() {
        let clock = SharedClock::new();
        clock.advance(Duration::from_millis(300));
        clock.advance(Duration::from_millis(200));
        assert_eq!(clock.now_mono(), Duration::from_millis(500));
    }

    #[test]
    fn set_never_goes_backwards() {
        let clock = SharedClock::new();
        clock.set(Duration::from_secs(5));
        clock.set(Duration::from_secs(2));
        assert_eq!(clock.now_mono(), Duration::from_secs(5));
    }

    #[test]
    fn advance_saturates() {
        let clock = SharedClock::new();
        clock.set(Duration::MAX);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now_mono(), Duration::MAX);
    }

    #[test]
    fn shared_clock_clones_see_advances() {
        let clock = SharedClock::new();
        let reader = clock.clone();
        clock.advance(Duration::from_millis(1500));
        clock.set(Duration::from_millis(10));
        assert_eq!(reader.now_mono(), Duration::from_millis(1500));
    }
}
