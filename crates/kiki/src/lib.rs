#![forbid(unsafe_code)]

//! KI und ich public facade crate.
//!
//! Re-exports the types a host needs from the internal crates and offers a
//! prelude for wiring the app together.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use kiki_core::clock::{MonotonicClock, SharedClock};
pub use kiki_core::event::{Event, KeyCode, KeyEvent, TouchEvent};
pub use kiki_core::gesture::{Swipe, SwipeRecognizer};

// --- Content re-exports ----------------------------------------------------

pub use kiki_content::{
    ContentError, ContentKind, ContentLoader, Fetch, LessonDescriptor, MemoryFetch,
    QuizDescriptor, ValidationError,
};

// --- Runtime re-exports ----------------------------------------------------

pub use kiki_runtime::{
    Cmd, Lifecycle, MemoryStorage, Model, Router, StateStore, StorageBackend, StorageError,
};

// --- Walker re-exports -----------------------------------------------------

pub use kiki_walkers::{
    Emotion, LessonWalker, Mascot, PASS_THRESHOLD, QuizEvent, QuizWalker, ResultTier,
    WalkerContext,
};

// --- App re-exports --------------------------------------------------------

#[cfg(feature = "web")]
pub use kiki_web::{Action, App, AppConfig, AppDeps, AppView, Kiki, KikiApp, Page, StepProgram};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for hosts embedding the app.
#[derive(Debug)]
pub enum Error {
    /// Lesson or quiz content could not be loaded.
    Content(ContentError),
    /// The progress store could not be read or written.
    Storage(StorageError),
    /// Host options could not be parsed.
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Config(msg) => write!(f, "invalid options: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Content(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

impl From<ContentError> for Error {
    fn from(err: ContentError) -> Self {
        Self::Content(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

/// Standard result type for facade APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Parse host options, reporting failures as [`Error::Config`].
#[cfg(feature = "web")]
pub fn parse_config(raw: &str) -> Result<AppConfig> {
    AppConfig::from_json(raw).map_err(|e| Error::Config(e.to_string()))
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Cmd, Emotion, Error, Event, KeyCode, Mascot, Model, Result, SharedClock, StateStore,
    };

    #[cfg(feature = "web")]
    pub use crate::{Action, App, AppConfig, AppDeps, Kiki, Page, StepProgram};

    pub use crate::{content, core, runtime, walkers};
    #[cfg(feature = "web")]
    pub use crate::web;
}

pub use kiki_content as content;
pub use kiki_core as core;
pub use kiki_runtime as runtime;
pub use kiki_walkers as walkers;
#[cfg(feature = "web")]
pub use kiki_web as web;
