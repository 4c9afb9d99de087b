#![forbid(unsafe_code)]

//! Application layer for KI und ich.
//!
//! - [`app`]: the route table, the page state, and walker orchestration
//! - [`kiki`]: the default mascot
//! - [`views`]: serialisable page models the host turns into markup
//! - [`step_program`]: host-driven runner with a simulated location
//! - [`config`] and [`catalog`]: startup options and static content
//!
//! On `wasm32` the crate also exports `KikiApp`, the `wasm-bindgen` surface
//! a page script drives with DOM events.

pub mod app;
pub mod catalog;
pub mod config;
pub mod kiki;
pub mod step_program;
pub mod views;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use app::{Action, App, AppDeps, AppError, AppResult, Msg, UnknownAction, routes};
pub use catalog::{LessonEntry, MINI_APPS, MiniApp};
pub use config::AppConfig;
pub use kiki::{Kiki, MascotView};
pub use step_program::{Location, StepOutputs, StepProgram, StepResult};
pub use views::{AppView, Page};

#[cfg(target_arch = "wasm32")]
pub use wasm::{BrowserFetch, KikiApp, LocalStorage};

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets. Native hosts drive [`StepProgram`] directly.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct KikiApp;

#[cfg(not(target_arch = "wasm32"))]
impl KikiApp {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
