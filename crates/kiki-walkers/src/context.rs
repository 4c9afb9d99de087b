#![forbid(unsafe_code)]

//! Shared collaborators handed to every walker, and the delayed effects
//! walkers ask their host to arm.

use std::rc::Rc;
use std::time::Duration;

use kiki_runtime::clock::{SystemClock, WallClock};
use kiki_runtime::listeners::{ListenerRegistry, SharedListeners};
use kiki_runtime::scheduler::Generation;
use kiki_runtime::state_persistence::StateStore;

use crate::mascot::MascotHandle;

/// Delay before a screen's mascot message is spoken.
pub const DEFAULT_SPEECH_DELAY: Duration = Duration::from_millis(300);
/// How long a screen's mascot message stays up.
pub const DEFAULT_SPEECH_DURATION: Duration = Duration::from_millis(5000);
/// Delay between answering and the next question.
pub const DEFAULT_AUTO_ADVANCE: Duration = Duration::from_millis(2000);

/// Walker timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkerTiming {
    pub speech_delay: Duration,
    pub speech_duration: Duration,
    pub auto_advance: Duration,
}

impl Default for WalkerTiming {
    fn default() -> Self {
        Self {
            speech_delay: DEFAULT_SPEECH_DELAY,
            speech_duration: DEFAULT_SPEECH_DURATION,
            auto_advance: DEFAULT_AUTO_ADVANCE,
        }
    }
}

/// Collaborators a walker is bound to.
#[derive(Clone)]
pub struct WalkerContext {
    pub store: Rc<StateStore>,
    pub mascot: MascotHandle,
    pub listeners: SharedListeners,
    pub clock: Rc<dyn WallClock>,
    pub timing: WalkerTiming,
}

impl WalkerContext {
    /// Context over `store` with no mascot, a private listener registry and
    /// the system clock.
    #[must_use]
    pub fn new(store: Rc<StateStore>) -> Self {
        Self {
            store,
            mascot: None,
            listeners: ListenerRegistry::shared(),
            clock: Rc::new(SystemClock),
            timing: WalkerTiming::default(),
        }
    }

    #[must_use]
    pub fn with_mascot(mut self, mascot: MascotHandle) -> Self {
        self.mascot = mascot;
        self
    }

    #[must_use]
    pub fn with_listeners(mut self, listeners: SharedListeners) -> Self {
        self.listeners = listeners;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn WallClock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_timing(mut self, timing: WalkerTiming) -> Self {
        self.timing = timing;
        self
    }
}

impl std::fmt::Debug for WalkerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkerContext")
            .field("store", &self.store)
            .field("mascot", &self.mascot.is_some())
            .field("timing", &self.timing)
            .finish()
    }
}

/// What a delayed effect does when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredAction {
    /// Mascot speech for the screen that armed it.
    Speak { text: String, duration: Duration },
    /// Move the quiz past an answered question.
    AutoAdvance,
}

/// A delayed effect. The host arms a timer for `delay` and hands the effect
/// back to the walker when it fires; the walker drops it if `generation` is
/// stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferred {
    pub delay: Duration,
    pub generation: Generation,
    pub action: DeferredAction,
}
