#![forbid(unsafe_code)]

//! The application model.
//!
//! [`App`] owns the route table, the persistent store, the content loaders,
//! and at most one active walker. Every fragment change tears the active
//! walker down, bumps the route generation, and dispatches the new path.
//! Content loads and delayed walker effects carry the route generation they
//! were started under; results arriving for a route the user already left are
//! dropped.
//!
//! # Routes
//!
//! | Pattern | Page |
//! |---------|------|
//! | `/` | home: lesson grid, sound toggle, greeting once per session |
//! | `/lesson/:id` | lesson walker (loading, then lesson or error) |
//! | `/quiz/:id` | quiz walker (loading, then quiz or error) |
//! | `/apps` | mini-app hub |
//! | `/apps/:app` | one mini-app, or not-found for unknown ids |
//! | `/teacher` | teacher overview with progress reset |
//! | `/404` | not-found |

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use kiki_content::{
    ContentKind, ContentResult, Fetch, LessonDescriptor, LessonLoader, QuizDescriptor, QuizLoader,
};
use kiki_core::event::{Event, KeyEvent, TouchEvent};
use kiki_runtime::clock::{SystemClock, WallClock};
use kiki_runtime::listeners::{ListenerRegistry, SharedListeners};
use kiki_runtime::program::{Cmd, Model};
use kiki_runtime::router::{Params, Resolution, Router, current_path};
use kiki_runtime::scheduler::{Generation, GenerationCounter};
use kiki_runtime::state_persistence::{Lifecycle, StateStore};
use kiki_walkers::mascot::{self, Emotion, Mascot, MascotHandle, SpeakOptions};
use kiki_walkers::{Deferred, LessonWalker, QuizEvent, QuizStep, QuizWalker, WalkerContext};

use crate::catalog;
use crate::config::AppConfig;
use crate::kiki::Kiki;
use crate::views::{
    AppView, AppsView, CrashView, ErrorView, HomeView, LoadingView, MiniAppView, NotFoundView,
    Page, TeacherView,
};

const GREETING: &str =
    "Hallo! Ich bin Kiki, dein Roboter-Freund. Klick auf eine Lektion, um loszulegen!";
const TEACHER_GREETING: &str = "Willkommen im Lehrer-Modus! Hier sehen Sie alle Inhalte.";
const RESET_MESSAGE: &str = "Alles zurueckgesetzt! Bereit fuer eine neue Klasse.";
const APPS_GREETING: &str = "Waehle eine App und hab Spass!";
const LESSON_FAILED: &str = "Oh nein! Die Lektion konnte nicht geladen werden.";
const QUIZ_FAILED: &str = "Oh nein! Das Quiz konnte nicht geladen werden.";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures a route handler can report. Any of them replaces the page with
/// the reload prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// A route matched without a parameter its handler needs.
    MissingParam(&'static str),
    /// The host reported an error nobody handled.
    Uncaught(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingParam(name) => write!(f, "route parameter `{name}` missing"),
            AppError::Uncaught(msg) => write!(f, "uncaught error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A control the host forwards from a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Lesson: next screen.
    Next,
    /// Lesson: previous screen.
    Prev,
    /// Lesson: jump to a screen (progress dots).
    GoTo(usize),
    /// Quiz: choose an answer.
    Answer(usize),
    /// Quiz results: take the quiz again.
    Retry,
    /// Home: flip the sound setting.
    ToggleSound,
    /// Teacher: reset all progress. The host has already confirmed.
    ResetProgress,
}

/// An action string the app does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action {:?}", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for Action {
    type Err = UnknownAction;

    /// Parse `next`, `prev`, `goto:<i>`, `answer:<i>`, `retry`,
    /// `toggle-sound` or `reset-progress`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownAction(s.to_owned());
        let index = |raw: &str| raw.parse::<usize>().map_err(|_| unknown());
        match s.split_once(':') {
            Some(("goto", i)) => Ok(Action::GoTo(index(i)?)),
            Some(("answer", i)) => Ok(Action::Answer(index(i)?)),
            Some(_) => Err(unknown()),
            None => match s {
                "next" => Ok(Action::Next),
                "prev" => Ok(Action::Prev),
                "retry" => Ok(Action::Retry),
                "toggle-sound" => Ok(Action::ToggleSound),
                "reset-progress" => Ok(Action::ResetProgress),
                _ => Err(unknown()),
            },
        }
    }
}

/// Top-level application message.
#[derive(Debug)]
pub enum Msg {
    /// The fragment changed; carries the derived path.
    Route(String),
    Key(KeyEvent),
    Touch(TouchEvent),
    Lifecycle(Lifecycle),
    Action(Action),
    /// Replace the page with the reload prompt.
    Crash(String),
    LessonLoaded {
        route: Generation,
        id: u32,
        result: ContentResult<Rc<LessonDescriptor>>,
    },
    QuizLoaded {
        route: Generation,
        id: u32,
        result: ContentResult<Rc<QuizDescriptor>>,
    },
    /// A walker effect whose timer elapsed.
    Fire {
        route: Generation,
        deferred: Deferred,
    },
    /// The delayed home greeting.
    Greet,
    /// Navigate home after a progress reset.
    ReturnHome { route: Generation },
    /// A timed speech bubble ran out.
    SpeechExpired,
}

impl From<Event> for Msg {
    fn from(event: Event) -> Self {
        match event {
            Event::HashChange { fragment } => Msg::Route(current_path(&fragment)),
            Event::Key(key) => Msg::Key(key),
            Event::Touch(touch) => Msg::Touch(touch),
            Event::Visibility(true) => Msg::Lifecycle(Lifecycle::Hidden),
            Event::Visibility(false) => Msg::Lifecycle(Lifecycle::Visible),
            Event::Unload => Msg::Lifecycle(Lifecycle::Unload),
            Event::Uncaught(err) => Msg::Crash(err),
        }
    }
}

impl From<Action> for Msg {
    fn from(action: Action) -> Self {
        Msg::Action(action)
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Route handler: renders into the app and returns follow-up commands.
pub type Handler = fn(&mut App, &Params) -> AppResult<Cmd<Msg>>;

/// Collaborators the app is built from.
pub struct AppDeps {
    pub store: Rc<StateStore>,
    pub fetch: Rc<dyn Fetch>,
    pub kiki: Option<Rc<Kiki>>,
    pub clock: Rc<dyn WallClock>,
    pub listeners: SharedListeners,
    /// Whether the mount element exists.
    pub mounted: bool,
}

impl AppDeps {
    #[must_use]
    pub fn new(store: Rc<StateStore>, fetch: Rc<dyn Fetch>) -> Self {
        Self {
            store,
            fetch,
            kiki: None,
            clock: Rc::new(SystemClock),
            listeners: ListenerRegistry::shared(),
            mounted: true,
        }
    }

    #[must_use]
    pub fn with_kiki(mut self, kiki: Rc<Kiki>) -> Self {
        self.kiki = Some(kiki);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn WallClock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_listeners(mut self, listeners: SharedListeners) -> Self {
        self.listeners = listeners;
        self
    }

    #[must_use]
    pub fn with_mounted(mut self, mounted: bool) -> Self {
        self.mounted = mounted;
        self
    }
}

enum Active {
    None,
    Lesson(LessonWalker),
    Quiz(QuizWalker),
}

/// The KI und ich application.
pub struct App {
    config: AppConfig,
    router: Router<Handler>,
    store: Rc<StateStore>,
    lessons: Rc<LessonLoader>,
    quizzes: Rc<QuizLoader>,
    kiki: Option<Rc<Kiki>>,
    mascot: MascotHandle,
    clock: Rc<dyn WallClock>,
    listeners: SharedListeners,
    inert: bool,
    route: GenerationCounter,
    path: String,
    page: Page,
    active: Active,
    greeted: bool,
}

/// The route table.
#[must_use]
pub fn routes() -> Router<Handler> {
    Router::with_routes([
        ("/", home as Handler),
        ("/lesson/:id", lesson as Handler),
        ("/quiz/:id", quiz as Handler),
        ("/apps", apps as Handler),
        ("/apps/:app", mini_app as Handler),
        ("/teacher", teacher as Handler),
        ("/404", not_found as Handler),
    ])
}

impl App {
    #[must_use]
    pub fn new(config: AppConfig, deps: AppDeps) -> Self {
        let lessons = Rc::new(LessonLoader::with_template(
            Rc::clone(&deps.fetch),
            config.lesson_path_template.clone(),
        ));
        let quizzes = Rc::new(QuizLoader::with_template(
            deps.fetch,
            config.quiz_path_template.clone(),
        ));
        let mascot: MascotHandle = deps.kiki.clone().map(|k| k as Rc<dyn Mascot>);
        Self {
            config,
            router: routes(),
            store: deps.store,
            lessons,
            quizzes,
            kiki: deps.kiki,
            mascot,
            clock: deps.clock,
            listeners: deps.listeners,
            inert: !deps.mounted,
            route: GenerationCounter::new(),
            path: String::new(),
            page: Page::Blank,
            active: Active::None,
            greeted: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Rc<StateStore> {
        &self.store
    }

    #[must_use]
    pub fn kiki(&self) -> Option<&Rc<Kiki>> {
        self.kiki.as_ref()
    }

    #[must_use]
    pub fn lesson_loader(&self) -> &LessonLoader {
        &self.lessons
    }

    #[must_use]
    pub fn quiz_loader(&self) -> &QuizLoader {
        &self.quizzes
    }

    #[must_use]
    pub fn listeners(&self) -> &SharedListeners {
        &self.listeners
    }

    /// Path of the last dispatched route.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    #[must_use]
    pub fn route_generation(&self) -> Generation {
        self.route.current()
    }

    #[must_use]
    pub fn lesson_walker(&self) -> Option<&LessonWalker> {
        match &self.active {
            Active::Lesson(w) => Some(w),
            _ => None,
        }
    }

    #[must_use]
    pub fn quiz_walker(&self) -> Option<&QuizWalker> {
        match &self.active {
            Active::Quiz(w) => Some(w),
            _ => None,
        }
    }

    /// The current page.
    #[must_use]
    pub fn page(&self) -> Page {
        match &self.active {
            Active::Lesson(w) => Page::Lesson(w.page()),
            Active::Quiz(w) => Page::Quiz(w.page()),
            Active::None => self.page.clone(),
        }
    }

    // --- dispatch ---

    fn dispatch(&mut self, path: String) -> Cmd<Msg> {
        if self.inert {
            tracing::debug!(%path, "dispatcher inert; ignoring route");
            return Cmd::none();
        }
        self.teardown();
        self.path = path;
        match self.router.resolve(&self.path) {
            Resolution::Matched {
                handler,
                params,
                pattern,
            } => {
                tracing::debug!(path = %self.path, %pattern, "route resolved");
                match handler(self, &params) {
                    Ok(cmd) => cmd,
                    Err(err) => self.crash(err),
                }
            }
            Resolution::Unmatched => {
                tracing::debug!(path = %self.path, "no route matched");
                self.page = Page::NotFound(NotFoundView::page());
                Cmd::none()
            }
        }
    }

    fn teardown(&mut self) {
        match std::mem::replace(&mut self.active, Active::None) {
            Active::Lesson(mut w) => w.destroy(),
            Active::Quiz(mut w) => w.destroy(),
            Active::None => {}
        }
        self.route.bump();
    }

    fn crash(&mut self, err: AppError) -> Cmd<Msg> {
        tracing::error!(%err, "unexpected failure; showing reload prompt");
        self.teardown();
        self.page = Page::Crashed(CrashView::default());
        Cmd::save_state()
    }

    fn walker_context(&self) -> WalkerContext {
        WalkerContext::new(Rc::clone(&self.store))
            .with_mascot(self.mascot.clone())
            .with_listeners(Rc::clone(&self.listeners))
            .with_clock(Rc::clone(&self.clock))
            .with_timing(self.config.walker_timing())
    }

    /// Arm timers for walker effects under the current route generation.
    fn arm(&self, deferred: Vec<Deferred>) -> Cmd<Msg> {
        let route = self.route.current();
        Cmd::batch(
            deferred
                .into_iter()
                .map(|d| Cmd::schedule(d.delay, Msg::Fire { route, deferred: d }))
                .collect(),
        )
    }

    fn apply_quiz(&self, step: QuizStep) -> Cmd<Msg> {
        for event in &step.events {
            match *event {
                QuizEvent::Answer { is_correct, .. } => {
                    if let Some(m) = &self.mascot {
                        m.react_to_answer(is_correct);
                    }
                }
                QuizEvent::Complete { score, total, .. } => {
                    if let Some(m) = &self.mascot {
                        m.react_to_quiz_end(score, total);
                    }
                }
            }
        }
        self.arm(step.deferred)
    }

    fn content_failed(&mut self, kind: ContentKind, id: &str, message: String) {
        self.page = Page::Error(ErrorView::content(kind, id, message));
        let text = match kind {
            ContentKind::Lesson => LESSON_FAILED,
            ContentKind::Quiz => QUIZ_FAILED,
        };
        mascot::set_emotion(&self.mascot, Emotion::Sad);
        mascot::speak(
            &self.mascot,
            text,
            SpeakOptions::for_duration(self.config.error_speech()),
        );
    }

    fn lesson_loaded(
        &mut self,
        route: Generation,
        id: u32,
        result: ContentResult<Rc<LessonDescriptor>>,
    ) -> Cmd<Msg> {
        if !self.route.is_current(route) {
            tracing::trace!(id, "dropping lesson load for a route already left");
            return Cmd::none();
        }
        match result {
            Ok(lesson) => {
                self.store.set_current_lesson(id);
                let mut walker = LessonWalker::new(lesson, self.walker_context())
                    .with_swipe_threshold(self.config.swipe_threshold);
                let deferred = walker.render();
                self.active = Active::Lesson(walker);
                self.arm(deferred)
            }
            Err(err) => {
                self.content_failed(ContentKind::Lesson, &id.to_string(), err.to_string());
                Cmd::none()
            }
        }
    }

    fn quiz_loaded(
        &mut self,
        route: Generation,
        id: u32,
        result: ContentResult<Rc<QuizDescriptor>>,
    ) -> Cmd<Msg> {
        if !self.route.is_current(route) {
            tracing::trace!(id, "dropping quiz load for a route already left");
            return Cmd::none();
        }
        match result {
            Ok(quiz) => {
                self.active = Active::Quiz(QuizWalker::new(quiz, self.walker_context()));
                Cmd::none()
            }
            Err(err) => {
                self.content_failed(ContentKind::Quiz, &id.to_string(), err.to_string());
                Cmd::none()
            }
        }
    }

    fn fire(&mut self, route: Generation, deferred: Deferred) -> Cmd<Msg> {
        if !self.route.is_current(route) {
            tracing::trace!("dropping timer armed under a previous route");
            return Cmd::none();
        }
        match &mut self.active {
            Active::Lesson(w) => {
                w.fire(deferred);
                Cmd::none()
            }
            Active::Quiz(w) => {
                let step = w.fire(deferred);
                self.apply_quiz(step)
            }
            Active::None => Cmd::none(),
        }
    }

    fn action(&mut self, action: Action) -> Cmd<Msg> {
        match (action, &mut self.active) {
            (Action::Next, Active::Lesson(w)) => {
                let d = w.next();
                self.arm(d)
            }
            (Action::Prev, Active::Lesson(w)) => {
                let d = w.prev();
                self.arm(d)
            }
            (Action::GoTo(i), Active::Lesson(w)) => {
                let d = w.go_to(i);
                self.arm(d)
            }
            (Action::Answer(i), Active::Quiz(w)) => {
                let step = w.answer(i);
                self.apply_quiz(step)
            }
            (Action::Retry, Active::Quiz(w)) if w.is_results() => {
                w.restart();
                Cmd::none()
            }
            (Action::ToggleSound, Active::None) if matches!(self.page, Page::Home(_)) => {
                self.store.set_sound_enabled(!self.store.sound_enabled());
                self.page = Page::Home(HomeView::build(&self.config.lessons, &self.store));
                Cmd::none()
            }
            (Action::ResetProgress, Active::None) if matches!(self.page, Page::Teacher(_)) => {
                self.store.reset();
                mascot::set_emotion(&self.mascot, Emotion::Surprised);
                mascot::speak(&self.mascot, RESET_MESSAGE, SpeakOptions::default());
                let route = self.route.current();
                Cmd::schedule(self.config.reset_delay(), Msg::ReturnHome { route })
            }
            (action, _) => {
                tracing::debug!(?action, "action does not apply to the current page");
                Cmd::none()
            }
        }
    }

    fn greet(&mut self) {
        if self.greeted || self.mascot.is_none() {
            return;
        }
        self.greeted = true;
        mascot::set_emotion(&self.mascot, Emotion::Happy);
        mascot::speak(&self.mascot, GREETING, SpeakOptions::default());
    }
}

impl Model for App {
    type Message = Msg;
    type View = AppView;

    fn init(&mut self) -> Cmd<Msg> {
        if self.inert {
            tracing::error!(
                selector = %self.config.mount_selector,
                "mount element missing; route dispatcher stays inert"
            );
        }
        if self.store.enable_auto_save() {
            tracing::debug!("auto-save enabled");
        }
        Cmd::none()
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        let cmd = match msg {
            Msg::Route(path) => self.dispatch(path),
            Msg::Key(key) => match &mut self.active {
                Active::Lesson(w) => {
                    let d = w.handle_key(&key);
                    self.arm(d)
                }
                _ => Cmd::none(),
            },
            Msg::Touch(touch) => match &mut self.active {
                Active::Lesson(w) => {
                    let d = w.handle_touch(touch);
                    self.arm(d)
                }
                _ => Cmd::none(),
            },
            Msg::Lifecycle(signal) => {
                self.store.handle_lifecycle(signal);
                Cmd::none()
            }
            Msg::Action(action) => self.action(action),
            Msg::Crash(message) => self.crash(AppError::Uncaught(message)),
            Msg::LessonLoaded { route, id, result } => self.lesson_loaded(route, id, result),
            Msg::QuizLoaded { route, id, result } => self.quiz_loaded(route, id, result),
            Msg::Fire { route, deferred } => self.fire(route, deferred),
            Msg::Greet => {
                self.greet();
                Cmd::none()
            }
            Msg::ReturnHome { route } if self.route.is_current(route) => Cmd::navigate("/"),
            Msg::ReturnHome { .. } | Msg::SpeechExpired => Cmd::none(),
        };
        // A timed bubble leaves the view only through a later render.
        match self.kiki.as_ref().and_then(|k| k.take_expiry()) {
            Some(left) => Cmd::batch(vec![cmd, Cmd::schedule(left, Msg::SpeechExpired)]),
            None => cmd,
        }
    }

    fn view(&self) -> AppView {
        AppView {
            path: self.path.clone(),
            page: self.page(),
            mascot: self.kiki.as_ref().map(|k| k.view()),
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = match &self.active {
            Active::None => "none",
            Active::Lesson(_) => "lesson",
            Active::Quiz(_) => "quiz",
        };
        f.debug_struct("App")
            .field("path", &self.path)
            .field("page", &self.page.name())
            .field("active", &active)
            .field("route", &self.route.current())
            .field("inert", &self.inert)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

fn param<'a>(params: &'a Params, name: &'static str) -> AppResult<&'a str> {
    params.get(name).ok_or(AppError::MissingParam(name))
}

fn home(app: &mut App, _params: &Params) -> AppResult<Cmd<Msg>> {
    app.store.set_last_visited(app.clock.now_utc());
    app.page = Page::Home(HomeView::build(&app.config.lessons, &app.store));
    if app.greeted || app.mascot.is_none() {
        return Ok(Cmd::none());
    }
    Ok(Cmd::schedule(app.config.greeting_delay(), Msg::Greet))
}

fn lesson(app: &mut App, params: &Params) -> AppResult<Cmd<Msg>> {
    let raw = param(params, "id")?;
    app.page = Page::Loading(LoadingView::new(ContentKind::Lesson));
    let Ok(id) = raw.parse::<u32>() else {
        app.content_failed(ContentKind::Lesson, raw, invalid_id(ContentKind::Lesson, raw));
        return Ok(Cmd::none());
    };
    let loader = Rc::clone(&app.lessons);
    let route = app.route.current();
    Ok(Cmd::task(async move {
        let result = loader.load(id).await;
        Msg::LessonLoaded { route, id, result }
    }))
}

fn quiz(app: &mut App, params: &Params) -> AppResult<Cmd<Msg>> {
    let raw = param(params, "id")?;
    app.page = Page::Loading(LoadingView::new(ContentKind::Quiz));
    mascot::set_emotion(&app.mascot, Emotion::Curious);
    let Ok(id) = raw.parse::<u32>() else {
        app.content_failed(ContentKind::Quiz, raw, invalid_id(ContentKind::Quiz, raw));
        return Ok(Cmd::none());
    };
    let loader = Rc::clone(&app.quizzes);
    let route = app.route.current();
    Ok(Cmd::task(async move {
        let result = loader.load(id).await;
        Msg::QuizLoaded { route, id, result }
    }))
}

fn invalid_id(kind: ContentKind, raw: &str) -> String {
    format!("{} {raw} nicht gefunden", kind.label())
}

fn apps(app: &mut App, _params: &Params) -> AppResult<Cmd<Msg>> {
    app.page = Page::Apps(AppsView::default());
    mascot::set_emotion_tag(&app.mascot, "excited");
    mascot::speak(&app.mascot, APPS_GREETING, SpeakOptions::default());
    Ok(Cmd::none())
}

fn mini_app(app: &mut App, params: &Params) -> AppResult<Cmd<Msg>> {
    let id = param(params, "app")?;
    app.page = match catalog::mini_app(id) {
        Some(found) => Page::MiniApp(MiniAppView::new(found)),
        None => Page::NotFound(NotFoundView::app()),
    };
    Ok(Cmd::none())
}

fn teacher(app: &mut App, _params: &Params) -> AppResult<Cmd<Msg>> {
    app.page = Page::Teacher(TeacherView::build(&app.config.lessons));
    mascot::set_emotion(&app.mascot, Emotion::Thoughtful);
    mascot::speak(&app.mascot, TEACHER_GREETING, SpeakOptions::default());
    Ok(Cmd::none())
}

fn not_found(app: &mut App, _params: &Params) -> AppResult<Cmd<Msg>> {
    app.page = Page::NotFound(NotFoundView::page());
    Ok(Cmd::none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use kiki_content::{ContentError, MemoryFetch};

    fn app() -> App {
        let deps = AppDeps::new(Rc::new(StateStore::in_memory()), Rc::new(MemoryFetch::new()));
        App::new(AppConfig::default(), deps)
    }

    fn run(app: &mut App, cmd: Cmd<Msg>) {
        for leaf in cmd.flatten() {
            if let Cmd::Task(fut) = leaf {
                let msg = block_on(fut);
                let next = app.update(msg);
                run(app, next);
            }
        }
    }

    #[test]
    fn actions_parse() {
        assert_eq!("next".parse(), Ok(Action::Next));
        assert_eq!("answer:2".parse(), Ok(Action::Answer(2)));
        assert_eq!("goto:0".parse(), Ok(Action::GoTo(0)));
        assert_eq!("reset-progress".parse(), Ok(Action::ResetProgress));
        assert!("answer:x".parse::<Action>().is_err());
        assert!("jump".parse::<Action>().is_err());
    }

    #[test]
    fn route_table_covers_every_path() {
        let router = routes();
        for path in ["/", "/lesson/1", "/quiz/1", "/apps", "/apps/joke", "/teacher"] {
            match router.resolve(path) {
                Resolution::Matched { pattern, .. } => assert_ne!(pattern, "/404", "{path}"),
                Resolution::Unmatched => panic!("{path} unmatched"),
            }
        }
        match router.resolve("/nope") {
            Resolution::Matched { pattern, params, .. } => {
                assert_eq!(pattern, "/404");
                assert!(params.is_empty());
            }
            Resolution::Unmatched => panic!("fallback missing"),
        }
    }

    #[test]
    fn non_numeric_id_shows_error_page() {
        let mut app = app();
        let cmd = app.update(Msg::Route("/lesson/abc".into()));
        assert!(cmd.is_none());
        assert_eq!(app.page().name(), "error");
    }

    #[test]
    fn missing_lesson_shows_error_and_is_not_cached() {
        let mut app = app();
        let cmd = app.update(Msg::Route("/lesson/9".into()));
        assert_eq!(app.page().name(), "loading");
        run(&mut app, cmd);
        let Page::Error(view) = app.page() else {
            panic!("expected error page");
        };
        assert_eq!(view.message, "Lektion 9 nicht gefunden");
        assert!(!app.lesson_loader().is_cached(9));
        assert_eq!(app.store().current_lesson(), 0);
    }

    #[test]
    fn stale_load_is_dropped() {
        let mut app = app();
        let route = app.route_generation();
        app.update(Msg::Route("/apps".into()));
        let cmd = app.update(Msg::LessonLoaded {
            route,
            id: 1,
            result: Err(ContentError::Status {
                kind: ContentKind::Lesson,
                id: 1,
                status: 404,
            }),
        });
        assert!(cmd.is_none());
        assert_eq!(app.page().name(), "apps");
    }

    #[test]
    fn inert_app_ignores_routes() {
        let deps = AppDeps::new(Rc::new(StateStore::in_memory()), Rc::new(MemoryFetch::new()))
            .with_mounted(false);
        let mut app = App::new(AppConfig::default(), deps);
        let _ = app.init();
        let _ = app.update(Msg::Route("/teacher".into()));
        assert!(app.is_inert());
        assert_eq!(app.page(), Page::Blank);
    }

    #[test]
    fn unknown_mini_app_is_not_found() {
        let mut app = app();
        app.update(Msg::Route("/apps/chess".into()));
        let Page::NotFound(view) = app.page() else {
            panic!("expected not-found page");
        };
        assert_eq!(view.heading, "App nicht gefunden");
    }

    #[test]
    fn sound_toggle_only_on_home() {
        let mut app = app();
        app.update(Msg::Route("/teacher".into()));
        app.update(Msg::Action(Action::ToggleSound));
        assert!(app.store().sound_enabled());
        app.update(Msg::Route("/".into()));
        app.update(Msg::Action(Action::ToggleSound));
        assert!(!app.store().sound_enabled());
        let Page::Home(view) = app.page() else {
            panic!("expected home page");
        };
        assert!(!view.sound.enabled);
    }

    #[test]
    fn crash_replaces_page() {
        let mut app = app();
        app.update(Msg::Route("/".into()));
        let cmd = app.update(Msg::from(Event::Uncaught("boom".into())));
        assert_eq!(cmd.type_name(), "SaveState");
        assert_eq!(app.page(), Page::Crashed(CrashView::default()));
    }
}
