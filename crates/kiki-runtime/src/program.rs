#![forbid(unsafe_code)]

//! Elm-style model and command types.
//!
//! A [`Model`] owns application state, turns messages into state changes, and
//! returns [`Cmd`] values describing side effects. The host-driven step
//! program executes the commands: it queues messages, arms timers, assigns the
//! URL fragment, and polls async tasks.
//!
//! # Example
//!
//! ```
//! use kiki_core::event::Event;
//! use kiki_runtime::program::{Cmd, Model};
//!
//! struct Counter {
//!     count: i32,
//! }
//!
//! enum Msg {
//!     Increment,
//!     Ignore,
//! }
//!
//! impl From<Event> for Msg {
//!     fn from(event: Event) -> Self {
//!         match event {
//!             Event::Key(_) => Msg::Increment,
//!             _ => Msg::Ignore,
//!         }
//!     }
//! }
//!
//! impl Model for Counter {
//!     type Message = Msg;
//!     type View = i32;
//!
//!     fn update(&mut self, msg: Msg) -> Cmd<Msg> {
//!         if let Msg::Increment = msg {
//!             self.count += 1;
//!         }
//!         Cmd::none()
//!     }
//!
//!     fn view(&self) -> i32 {
//!         self.count
//!     }
//! }
//! ```

use std::time::Duration;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use kiki_core::event::Event;

/// Application state and behavior.
pub trait Model: Sized {
    /// The message type for this model.
    ///
    /// Must be convertible from host events.
    type Message: From<Event> + 'static;

    /// Serialisable description of what the host should show.
    type View;

    /// Initialize the model with startup commands.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// Update the model in response to a message.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    /// Build the current view.
    fn view(&self) -> Self::View;
}

/// Side effects to be executed by the runtime.
#[derive(Default)]
pub enum Cmd<M> {
    /// No operation.
    #[default]
    None,
    /// Execute multiple commands in order.
    Batch(Vec<Cmd<M>>),
    /// Send a message to the model.
    Msg(M),
    /// Deliver `msg` once `delay` has elapsed on the host clock.
    Schedule { delay: Duration, msg: M },
    /// Assign the URL fragment. The host reports the change back as an
    /// `Event::HashChange`; assigning the current fragment is a no-op.
    Navigate(String),
    /// Drive a future to completion and deliver its output.
    Task(LocalBoxFuture<'static, M>),
    /// Flush the persistent store.
    SaveState,
    /// Record a line in the host log.
    Log(String),
}

impl<M: std::fmt::Debug> std::fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Schedule { delay, msg } => f
                .debug_struct("Schedule")
                .field("delay", delay)
                .field("msg", msg)
                .finish(),
            Self::Navigate(path) => f.debug_tuple("Navigate").field(path).finish(),
            Self::Task(_) => write!(f, "Task(..)"),
            Self::SaveState => write!(f, "SaveState"),
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
        }
    }
}

impl<M> Cmd<M> {
    /// Create a no-op command.
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    /// Create a message command.
    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    /// Create a log command.
    #[inline]
    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log(msg.into())
    }

    /// Create a batch of commands, dropping no-ops.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Self::Batch(cmds),
        }
    }

    /// Deliver `msg` after `delay`.
    #[inline]
    pub fn schedule(delay: Duration, msg: M) -> Self {
        Self::Schedule { delay, msg }
    }

    /// Navigate to `path` by assigning the fragment `#path`.
    #[inline]
    pub fn navigate(path: impl Into<String>) -> Self {
        Self::Navigate(path.into())
    }

    /// Run `future` and deliver its output as a message.
    pub fn task<F>(future: F) -> Self
    where
        F: std::future::Future<Output = M> + 'static,
    {
        Self::Task(future.boxed_local())
    }

    /// Create a save state command.
    #[inline]
    pub fn save_state() -> Self {
        Self::SaveState
    }

    /// Whether this is [`Cmd::None`].
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Return a stable name for tracing.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Batch(_) => "Batch",
            Self::Msg(_) => "Msg",
            Self::Schedule { .. } => "Schedule",
            Self::Navigate(_) => "Navigate",
            Self::Task(_) => "Task",
            Self::SaveState => "SaveState",
            Self::Log(_) => "Log",
        }
    }

    /// Flatten nested batches into a list of leaf commands, in order.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn batch_collapses() {
        let cmd: Cmd<u8> = Cmd::batch(vec![]);
        assert!(cmd.is_none());
        let cmd: Cmd<u8> = Cmd::batch(vec![Cmd::none(), Cmd::msg(1), Cmd::none()]);
        assert!(matches!(cmd, Cmd::Msg(1)));
        let cmd: Cmd<u8> = Cmd::batch(vec![Cmd::msg(1), Cmd::save_state()]);
        assert_eq!(cmd.type_name(), "Batch");
    }

    #[test]
    fn flatten_preserves_order() {
        let cmd: Cmd<u8> = Cmd::Batch(vec![
            Cmd::msg(1),
            Cmd::Batch(vec![Cmd::navigate("/x"), Cmd::None]),
            Cmd::log("done"),
        ]);
        let names: Vec<_> = cmd.flatten().iter().map(Cmd::type_name).collect();
        assert_eq!(names, vec!["Msg", "Navigate", "Log"]);
    }

    #[test]
    fn task_output_is_message() {
        let cmd: Cmd<u8> = Cmd::task(async { 7 });
        match cmd {
            Cmd::Task(fut) => assert_eq!(block_on(fut), 7),
            other => panic!("expected task, got {other:?}"),
        }
    }

    #[test]
    fn debug_hides_task_body() {
        let cmd: Cmd<u8> = Cmd::task(async { 1 });
        assert_eq!(format!("{cmd:?}"), "Task(..)");
        let cmd: Cmd<u8> = Cmd::schedule(Duration::from_millis(5), 2);
        assert!(format!("{cmd:?}").contains("Schedule"));
    }
}
