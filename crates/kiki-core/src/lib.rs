#![forbid(unsafe_code)]

//! Core: host-neutral input events, gesture recognition, clocks, and logging.

pub mod clock;
pub mod event;
pub mod gesture;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
