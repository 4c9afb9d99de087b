#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! This module defines the host-neutral events the app core reacts to. The
//! embedding environment (a browser page, a test harness) translates its own
//! notifications into these values and pushes them into the program.
//!
//! # Design Notes
//!
//! - Key codes are derived from DOM `KeyboardEvent.key` strings
//! - Touch coordinates are screen-space pixels as reported by the host
//! - Only the keys the lesson walker reads get their own code

/// Canonical input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A touch contact started or ended.
    Touch(TouchEvent),

    /// The URL fragment changed (or the page loaded with a fragment).
    ///
    /// Carries the raw fragment including its leading `#`, if any.
    HashChange {
        /// Raw fragment as reported by the host.
        fragment: String,
    },

    /// Page visibility changed.
    ///
    /// `true` = the page became hidden (tab switch, minimise).
    Visibility(bool),

    /// The page is about to be unloaded.
    Unload,

    /// The host reported an error nobody handled.
    Uncaught(String),
}

impl Event {
    /// Convenience constructor for a key press.
    #[must_use]
    pub const fn key(code: KeyCode) -> Self {
        Self::Key(KeyEvent::new(code))
    }

    /// Convenience constructor for a fragment change.
    #[must_use]
    pub fn hash_change(fragment: impl Into<String>) -> Self {
        Self::HashChange {
            fragment: fragment.into(),
        }
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event of Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this event should drive navigation (press or auto-repeat).
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        !matches!(self.kind, KeyEventKind::Release)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),

    /// Left arrow key.
    Left,

    /// Right arrow key.
    Right,

    /// Any key the core has no use for.
    Other,
}

impl KeyCode {
    /// Map a DOM `KeyboardEvent.key` value to a key code.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "ArrowLeft" | "Left" => Self::Left,
            "ArrowRight" | "Right" => Self::Right,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Self::Char(ch),
                    _ => Self::Other,
                }
            }
        }
    }
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

/// A touch event reduced to what swipe recognition needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    /// Whether the contact started or ended.
    pub phase: TouchPhase,
    /// Horizontal screen position of the first changed touch.
    pub screen_x: f64,
}

impl TouchEvent {
    /// A touch contact began at `screen_x`.
    #[must_use]
    pub const fn start(screen_x: f64) -> Self {
        Self {
            phase: TouchPhase::Start,
            screen_x,
        }
    }

    /// A touch contact ended at `screen_x`.
    #[must_use]
    pub const fn end(screen_x: f64) -> Self {
        Self {
            phase: TouchPhase::End,
            screen_x,
        }
    }
}

/// Touch lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// `touchstart`.
    Start,
    /// `touchend`.
    End,
}
