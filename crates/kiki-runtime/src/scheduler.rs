#![forbid(unsafe_code)]

//! Deterministic timer queue and generation tokens.
//!
//! Delayed effects (mascot speech, quiz auto-advance, post-reset redirect) are
//! armed on a [`Scheduler`] against host monotonic time. Timers fire in due
//! order; timers with equal due times fire in scheduling order.
//!
//! A [`Generation`] token ties a delayed effect to the owner that armed it.
//! Owners bump their [`GenerationCounter`] on teardown or navigation; a timer
//! whose token no longer matches is dropped by the receiver.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

/// Opaque epoch of a timer owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Monotonic source of generations.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Generation,
}

impl GenerationCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation that timers armed now should carry.
    #[must_use]
    pub const fn current(&self) -> Generation {
        self.current
    }

    /// Invalidate every token issued so far and return the new generation.
    pub fn bump(&mut self) -> Generation {
        self.current = Generation(self.current.0.wrapping_add(1));
        self.current
    }

    /// Whether `token` is still current.
    #[must_use]
    pub fn is_current(&self, token: Generation) -> bool {
        token == self.current
    }
}

struct Entry<M> {
    due: Duration,
    seq: u64,
    msg: M,
}

impl<M> PartialEq for Entry<M> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<M> Eq for Entry<M> {}

impl<M> PartialOrd for Entry<M> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<M> Ord for Entry<M> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Min-heap of pending timers.
pub struct Scheduler<M> {
    heap: BinaryHeap<Reverse<Entry<M>>>,
    next_seq: u64,
}

impl<M> Default for Scheduler<M> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<M> std::fmt::Debug for Scheduler<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.heap.len())
            .field("next_due", &self.next_due())
            .finish()
    }
}

impl<M> Scheduler<M> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `msg` to fire at `now + delay`.
    pub fn schedule(&mut self, now: Duration, delay: Duration, msg: M) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry {
            due: now.saturating_add(delay),
            seq,
            msg,
        }));
    }

    /// Remove and return every timer due at or before `now`, in firing order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<M> {
        let mut fired = Vec::new();
        while self.heap.peek().is_some_and(|Reverse(e)| e.due <= now) {
            if let Some(Reverse(entry)) = self.heap.pop() {
                fired.push(entry.msg);
            }
        }
        fired
    }

    /// Due time of the earliest pending timer.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(e)| e.due)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
