#![forbid(unsafe_code)]

//! Horizontal swipe recognition.
//!
//! A [`SwipeRecognizer`] pairs a touch start with the following touch end and
//! reports a [`Swipe`] when the horizontal travel strictly exceeds the
//! configured threshold. Shorter drags (taps, jitter) produce nothing.

use crate::event::{TouchEvent, TouchPhase};

/// Default minimum horizontal travel, in pixels.
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 50.0;

/// Direction of a recognised swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Swipe {
    /// Finger travelled right-to-left.
    Left,
    /// Finger travelled left-to-right.
    Right,
}

/// Stateful recogniser fed with raw touch events.
#[derive(Debug, Clone)]
pub struct SwipeRecognizer {
    threshold: f64,
    start_x: Option<f64>,
}

impl Default for SwipeRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_SWIPE_THRESHOLD)
    }
}

impl SwipeRecognizer {
    /// Create a recogniser with the given threshold.
    ///
    /// Non-finite or negative thresholds fall back to the default.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() && threshold >= 0.0 {
            threshold
        } else {
            DEFAULT_SWIPE_THRESHOLD
        };
        Self {
            threshold,
            start_x: None,
        }
    }

    /// Configured threshold in pixels.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Feed one touch event. Returns a swipe when an end completes one.
    pub fn feed(&mut self, event: TouchEvent) -> Option<Swipe> {
        match event.phase {
            TouchPhase::Start => {
                self.start_x = Some(event.screen_x);
                None
            }
            TouchPhase::End => {
                let start = self.start_x.take()?;
                classify(start - event.screen_x, self.threshold)
            }
        }
    }

    /// Drop any half-finished gesture.
    pub fn reset(&mut self) {
        self.start_x = None;
    }
}

fn classify(diff: f64, threshold: f64) -> Option<Swipe> {
    if !diff.is_finite() || diff.abs() <= threshold {
        return None;
    }
    if diff > 0.0 {
        Some(Swipe::Left)
    } else {
        Some(Swipe::Right)
    }
}
