#![forbid(unsafe_code)]

//! Step-based program runner.
//!
//! [`StepProgram`] drives a [`Model`] through init / event / update / view
//! cycles without threads or blocking. The host controls the loop:
//!
//! 1. Push events via [`StepProgram::push_event`].
//! 2. Advance time via [`StepProgram::advance_time`].
//! 3. Call [`StepProgram::step`] to process events, fire due timers, poll
//!    pending tasks, and render.
//! 4. Read the rendered view via [`StepProgram::take_outputs`].
//!
//! Navigation commands assign a simulated location. The location reports a
//! fragment change back as an event only when the fragment actually changed,
//! the way a browser fires `hashchange`.
//!
//! # Example
//!
//! ```ignore
//! use kiki_web::step_program::StepProgram;
//! use kiki_core::event::Event;
//! use core::time::Duration;
//!
//! let mut prog = StepProgram::new(app);
//! prog.init("#/");
//!
//! prog.push_event(Event::hash_change("#/lesson/1"));
//! prog.advance_time(Duration::from_millis(300));
//! let result = prog.step();
//!
//! if result.rendered {
//!     let view = prog.take_outputs().last_view;
//! }
//! ```

use std::collections::VecDeque;
use std::task::{Context, Poll};

use core::time::Duration;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::task::noop_waker_ref;
use kiki_core::clock::{MonotonicClock, SharedClock};
use kiki_core::event::Event;
use kiki_runtime::program::{Cmd, Model};
use kiki_runtime::scheduler::Scheduler;

/// Timer rounds per step; zero-delay reschedules beyond this wait for the
/// next step.
const MAX_TIMER_ROUNDS: usize = 64;

/// Result of a single [`StepProgram::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// Whether a view was rendered during this step.
    pub rendered: bool,
    /// Number of events processed during this step.
    pub events_processed: u32,
    /// Number of timers that fired during this step.
    pub timers_fired: u32,
    /// Tasks still pending after this step.
    pub tasks_pending: usize,
    /// Current frame index (monotonically increasing).
    pub frame_idx: u64,
}

/// Captured host-facing output.
#[derive(Debug)]
pub struct StepOutputs<V> {
    /// The most recent rendered view.
    pub last_view: Option<V>,
    /// Lines from `Cmd::Log`.
    pub logs: Vec<String>,
    /// Fragments assigned by `Cmd::Navigate`, in order.
    pub navigations: Vec<String>,
    /// Number of `Cmd::SaveState` requests.
    pub save_requests: u32,
}

impl<V> Default for StepOutputs<V> {
    fn default() -> Self {
        Self {
            last_view: None,
            logs: Vec::new(),
            navigations: Vec::new(),
            save_requests: 0,
        }
    }
}

/// Simulated `window.location.hash`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    fragment: String,
}

impl Location {
    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Assign `#path`. Returns the new fragment when it differs from the
    /// current one.
    pub fn assign(&mut self, path: &str) -> Option<String> {
        let fragment = if path.starts_with('#') {
            path.to_owned()
        } else {
            format!("#{path}")
        };
        if fragment == self.fragment {
            return None;
        }
        self.fragment = fragment.clone();
        Some(fragment)
    }
}

/// Host-driven, non-blocking program runner.
pub struct StepProgram<M: Model> {
    model: M,
    clock: SharedClock,
    events: VecDeque<Event>,
    scheduler: Scheduler<M::Message>,
    tasks: Vec<LocalBoxFuture<'static, M::Message>>,
    location: Location,
    outputs: StepOutputs<M::View>,
    save_hook: Option<Box<dyn FnMut()>>,
    initialized: bool,
    dirty: bool,
    frame_idx: u64,
}

impl<M: Model> StepProgram<M> {
    /// Create a step program with its own clock starting at zero.
    #[must_use]
    pub fn new(model: M) -> Self {
        Self::with_clock(model, SharedClock::new())
    }

    /// Create a step program that advances `clock`.
    #[must_use]
    pub fn with_clock(model: M, clock: SharedClock) -> Self {
        Self {
            model,
            clock,
            events: VecDeque::new(),
            scheduler: Scheduler::new(),
            tasks: Vec::new(),
            location: Location::default(),
            outputs: StepOutputs::default(),
            save_hook: None,
            initialized: false,
            dirty: true,
            frame_idx: 0,
        }
    }

    /// Run `hook` for every `Cmd::SaveState`.
    #[must_use]
    pub fn with_save_hook(mut self, hook: impl FnMut() + 'static) -> Self {
        self.save_hook = Some(Box::new(hook));
        self
    }

    /// Initialize the model, deliver the initial fragment, and render.
    ///
    /// Calling it a second time does nothing.
    pub fn init(&mut self, fragment: &str) -> StepResult {
        if self.initialized {
            return self.idle_result();
        }
        self.initialized = true;
        let cmd = self.model.init();
        self.execute_cmd(cmd);
        self.location.fragment = fragment.to_owned();
        self.events.push_back(Event::hash_change(fragment));
        self.step()
    }

    /// Process pending events, fire due timers, poll tasks, and render if
    /// dirty.
    pub fn step(&mut self) -> StepResult {
        if !self.initialized {
            tracing::warn!("step() before init(); ignoring");
            return self.idle_result();
        }

        // 1. Events, including fragment changes raised while processing.
        let mut events_processed: u32 = 0;
        while let Some(event) = self.events.pop_front() {
            events_processed += 1;
            self.handle_msg(M::Message::from(event));
        }

        // 2. Due timers. Handlers may arm new zero-delay timers or push
        //    events, so loop until quiet.
        let mut timers_fired: u32 = 0;
        for _ in 0..MAX_TIMER_ROUNDS {
            let now = self.clock.now_mono();
            let due = self.scheduler.drain_due(now);
            if due.is_empty() {
                break;
            }
            for msg in due {
                timers_fired += 1;
                self.handle_msg(msg);
            }
            while let Some(event) = self.events.pop_front() {
                events_processed += 1;
                self.handle_msg(M::Message::from(event));
            }
        }

        // 3. Pending tasks.
        self.poll_tasks();

        // 4. Render if dirty.
        let rendered = if self.dirty {
            self.render();
            true
        } else {
            false
        };

        StepResult {
            rendered,
            events_processed,
            timers_fired,
            tasks_pending: self.tasks.len(),
            frame_idx: self.frame_idx,
        }
    }

    /// Queue an event for the next [`step`](Self::step).
    ///
    /// A fragment change also updates the simulated location.
    pub fn push_event(&mut self, event: Event) {
        if let Event::HashChange { fragment } = &event {
            self.location.fragment.clone_from(fragment);
        }
        self.events.push_back(event);
    }

    /// Deliver a message directly to the model, bypassing the event queue.
    pub fn send(&mut self, msg: M::Message) {
        self.handle_msg(msg);
    }

    /// Advance the host clock by `dt`.
    pub fn advance_time(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    /// Advance the host clock by a host-reported delta in milliseconds.
    /// Deltas that are negative, not finite, or beyond `Duration` are ignored.
    pub fn advance_time_ms(&mut self, ms: f64) {
        if let Ok(dt) = Duration::try_from_secs_f64(ms / 1000.0) {
            self.clock.advance(dt);
        }
    }

    /// Set the host clock to an absolute time.
    pub fn set_time(&mut self, now: Duration) {
        self.clock.set(now);
    }

    /// Advance time in `slice`-sized increments up to `total`, stepping after
    /// each increment.
    pub fn run_for(&mut self, total: Duration, slice: Duration) {
        let slice = if slice.is_zero() { total } else { slice };
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            let dt = slice.min(total - elapsed);
            self.advance_time(dt);
            elapsed += dt;
            self.step();
        }
    }

    /// Take the captured outputs, leaving empty defaults.
    pub fn take_outputs(&mut self) -> StepOutputs<M::View> {
        std::mem::take(&mut self.outputs)
    }

    /// Read the captured outputs without consuming them.
    pub fn outputs(&self) -> &StepOutputs<M::View> {
        &self.outputs
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        self.dirty = true;
        &mut self.model
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn frame_idx(&self) -> u64 {
        self.frame_idx
    }

    /// Timers not yet fired.
    pub fn pending_timers(&self) -> usize {
        self.scheduler.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    // --- Private helpers ---

    fn idle_result(&self) -> StepResult {
        StepResult {
            rendered: false,
            events_processed: 0,
            timers_fired: 0,
            tasks_pending: self.tasks.len(),
            frame_idx: self.frame_idx,
        }
    }

    fn handle_msg(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.dirty = true;
        self.execute_cmd(cmd);
    }

    fn render(&mut self) {
        self.outputs.last_view = Some(self.model.view());
        self.dirty = false;
        self.frame_idx += 1;
    }

    fn poll_tasks(&mut self) {
        let mut cx = Context::from_waker(noop_waker_ref());
        // A completed task may spawn another; keep polling until none of the
        // pending tasks makes progress.
        loop {
            let mut ready = Vec::new();
            let mut pending = Vec::with_capacity(self.tasks.len());
            for mut task in self.tasks.drain(..) {
                match task.poll_unpin(&mut cx) {
                    Poll::Ready(msg) => ready.push(msg),
                    Poll::Pending => pending.push(task),
                }
            }
            self.tasks = pending;
            if ready.is_empty() {
                break;
            }
            for msg in ready {
                self.handle_msg(msg);
            }
        }
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Msg(m) => self.handle_msg(m),
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute_cmd(c);
                }
            }
            Cmd::Schedule { delay, msg } => {
                let now = self.clock.now_mono();
                self.scheduler.schedule(now, delay, msg);
            }
            Cmd::Navigate(path) => {
                if let Some(fragment) = self.location.assign(&path) {
                    self.outputs.navigations.push(fragment.clone());
                    self.events.push_back(Event::hash_change(fragment));
                }
            }
            Cmd::Task(task) => self.tasks.push(task),
            Cmd::SaveState => {
                self.outputs.save_requests += 1;
                if let Some(hook) = self.save_hook.as_mut() {
                    hook();
                }
            }
            Cmd::Log(text) => {
                tracing::info!(target: "kiki_web::log", "{text}");
                self.outputs.logs.push(text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiki_core::event::KeyCode;
    use pretty_assertions::assert_eq;

    // ---- Test model ----

    #[derive(Default)]
    struct Counter {
        value: i32,
        paths: Vec<String>,
    }

    #[derive(Debug)]
    enum CounterMsg {
        Increment,
        Route(String),
        Later,
        Go(&'static str),
        Fetch,
        Save,
        Ignore,
    }

    impl From<Event> for CounterMsg {
        fn from(event: Event) -> Self {
            match event {
                Event::Key(k) if k.code == KeyCode::Char('+') => CounterMsg::Increment,
                Event::Key(k) if k.code == KeyCode::Char('l') => CounterMsg::Later,
                Event::Key(k) if k.code == KeyCode::Char('f') => CounterMsg::Fetch,
                Event::Key(k) if k.code == KeyCode::Char('s') => CounterMsg::Save,
                Event::HashChange { fragment } => CounterMsg::Route(fragment),
                _ => CounterMsg::Ignore,
            }
        }
    }

    impl Model for Counter {
        type Message = CounterMsg;
        type View = (i32, Vec<String>);

        fn update(&mut self, msg: CounterMsg) -> Cmd<CounterMsg> {
            match msg {
                CounterMsg::Increment => {
                    self.value += 1;
                    Cmd::none()
                }
                CounterMsg::Route(fragment) => {
                    self.paths.push(fragment);
                    Cmd::none()
                }
                CounterMsg::Later => {
                    Cmd::schedule(Duration::from_millis(100), CounterMsg::Increment)
                }
                CounterMsg::Go(path) => Cmd::navigate(path),
                CounterMsg::Fetch => Cmd::task(async { CounterMsg::Increment }),
                CounterMsg::Save => Cmd::batch(vec![Cmd::save_state(), Cmd::log("saved")]),
                CounterMsg::Ignore => Cmd::none(),
            }
        }

        fn view(&self) -> (i32, Vec<String>) {
            (self.value, self.paths.clone())
        }
    }

    fn program() -> StepProgram<Counter> {
        let mut prog = StepProgram::new(Counter::default());
        prog.init("#/");
        prog
    }

    #[test]
    fn init_delivers_initial_fragment() {
        let mut prog = program();
        let view = prog.take_outputs().last_view.unwrap();
        assert_eq!(view, (0, vec!["#/".to_owned()]));
        assert_eq!(prog.location().fragment(), "#/");
    }

    #[test]
    fn second_init_is_ignored() {
        let mut prog = program();
        let result = prog.init("#/other");
        assert!(!result.rendered);
        assert_eq!(prog.location().fragment(), "#/");
    }

    #[test]
    fn step_without_events_does_not_render() {
        let mut prog = program();
        assert!(!prog.step().rendered);
    }

    #[test]
    fn timers_fire_when_due() {
        let mut prog = program();
        prog.push_event(Event::key(KeyCode::Char('l')));
        prog.step();
        assert_eq!(prog.pending_timers(), 1);
        prog.advance_time(Duration::from_millis(99));
        assert_eq!(prog.step().timers_fired, 0);
        prog.advance_time(Duration::from_millis(1));
        let result = prog.step();
        assert_eq!(result.timers_fired, 1);
        assert_eq!(prog.model().value, 1);
    }

    #[test]
    fn navigate_to_new_fragment_raises_hash_change() {
        let mut prog = program();
        prog.send(CounterMsg::Go("/lesson/1"));
        prog.step();
        assert_eq!(prog.model().paths, vec!["#/", "#/lesson/1"]);
        assert_eq!(prog.take_outputs().navigations, vec!["#/lesson/1"]);
    }

    #[test]
    fn navigate_to_current_fragment_is_silent() {
        let mut prog = program();
        prog.send(CounterMsg::Go("/"));
        prog.step();
        assert_eq!(prog.model().paths, vec!["#/"]);
    }

    #[test]
    fn ready_tasks_complete_within_the_step() {
        let mut prog = program();
        prog.push_event(Event::key(KeyCode::Char('f')));
        let result = prog.step();
        assert_eq!(result.tasks_pending, 0);
        assert_eq!(prog.model().value, 1);
    }

    #[test]
    fn save_requests_run_the_hook() {
        use std::cell::Cell;
        use std::rc::Rc;

        let saves = Rc::new(Cell::new(0));
        let seen = Rc::clone(&saves);
        let mut prog =
            StepProgram::new(Counter::default()).with_save_hook(move || seen.set(seen.get() + 1));
        prog.init("#/");
        prog.push_event(Event::key(KeyCode::Char('s')));
        prog.step();
        assert_eq!(saves.get(), 1);
        let outputs = prog.take_outputs();
        assert_eq!(outputs.save_requests, 1);
        assert_eq!(outputs.logs, vec!["saved"]);
    }

    #[test]
    fn run_for_slices_time() {
        let mut prog = program();
        prog.push_event(Event::key(KeyCode::Char('l')));
        prog.step();
        prog.run_for(Duration::from_millis(250), Duration::from_millis(50));
        assert_eq!(prog.clock().now_mono(), Duration::from_millis(250));
        assert_eq!(prog.model().value, 1);
    }

    #[test]
    fn host_millis_out_of_range_are_ignored() {
        let mut prog = program();
        prog.advance_time_ms(250.0);
        assert_eq!(prog.clock().now_mono(), Duration::from_millis(250));
        for bad in [-5.0, f64::NAN, f64::INFINITY, 1e300] {
            prog.advance_time_ms(bad);
        }
        assert_eq!(prog.clock().now_mono(), Duration::from_millis(250));
    }
}
