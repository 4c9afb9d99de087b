#![forbid(unsafe_code)]

//! Runtime for the KI und ich app core.
//!
//! - [`program`]: Elm-style `Model` and `Cmd`
//! - [`router`]: fragment-path route dispatcher
//! - [`state_persistence`]: the persistent progress store
//! - [`scheduler`]: deterministic timers and generation tokens
//! - [`listeners`]: host listener bookkeeping
//! - [`clock`]: wall-clock timestamps

pub mod clock;
pub mod listeners;
pub mod program;
pub mod router;
pub mod scheduler;
pub mod state_persistence;

pub use clock::{FixedClock, SystemClock, WallClock};
pub use listeners::{ListenerId, ListenerKind, ListenerRegistry, SharedListeners};
pub use program::{Cmd, Model};
pub use router::{Params, Resolution, RoutePattern, Router, Segment, current_path, extract_params};
pub use scheduler::{Generation, GenerationCounter, Scheduler};
#[cfg(feature = "state-persistence")]
pub use state_persistence::FileStorage;
pub use state_persistence::{
    Lifecycle, MemoryStorage, QuizScore, StateStore, StorageBackend, StorageError, StorageResult,
    is_storage_available,
};
