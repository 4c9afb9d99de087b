//! End-to-end navigation scenarios driven through the step program.
//!
//! Each test wires the real app to in-memory content, an in-memory store, the
//! default mascot, and a fixed wall clock, then drives it the way a page
//! script would: fragment changes, clicks, key presses, and time.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use kiki_content::{Fetch, FetchError, FetchResponse, MemoryFetch};
use kiki_core::clock::SharedClock;
use kiki_core::event::{Event, KeyCode, TouchEvent};
use kiki_runtime::clock::FixedClock;
use kiki_runtime::listeners::ListenerKind;
use kiki_runtime::state_persistence::{MemoryStorage, StateStore, StorageBackend, StorageResult};
use kiki_walkers::mascot::Emotion;
use kiki_walkers::{Forward, QuizPage, ResultTier};
use kiki_web::{Action, App, AppConfig, AppDeps, Kiki, Msg, Page, StepProgram};
use pretty_assertions::assert_eq;
use serde_json::json;

const LESSON_PATH: &str = "./src/data/lessons/lesson-1.json";
const QUIZ_PATH: &str = "./src/data/quizzes/quiz-3.json";

/// Storage that counts writes.
#[derive(Default)]
struct CountingStorage {
    inner: MemoryStorage,
    writes: Rc<Cell<usize>>,
}

impl StorageBackend for CountingStorage {
    fn name(&self) -> &str {
        "CountingStorage"
    }

    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        self.writes.set(self.writes.get() + 1);
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key)
    }
}

fn content() -> MemoryFetch {
    let fetch = MemoryFetch::new();
    fetch.insert(
        LESSON_PATH,
        json!({
            "id": 1,
            "title": "Was ist KI?",
            "screens": [
                {"type": "intro", "content": {"headline": "Hallo!"},
                 "kikiEmotion": "happy", "kikiMessage": "Los geht's!"},
                {"type": "explanation", "content": {"text": "KI lernt aus Beispielen."}},
                {"type": "example", "content": {"text": "Ein Sprachassistent."}},
                {"type": "summary", "content": {"summary": ["KI ist ein Werkzeug"]}}
            ]
        })
        .to_string(),
    );
    let questions: Vec<_> = [0, 1, 0, 2, 1]
        .iter()
        .enumerate()
        .map(|(i, correct)| {
            json!({
                "question": format!("Frage {}", i + 1),
                "answers": ["A", "B", "C"],
                "correctIndex": correct,
                "feedback": {"correct": "Richtig!", "incorrect": "Leider falsch."}
            })
        })
        .collect();
    fetch.insert(
        QUIZ_PATH,
        json!({"lessonId": 3, "title": "Quiz: Was kann KI heute?", "questions": questions})
            .to_string(),
    );
    fetch
}

/// Transport whose requests never complete.
struct StalledFetch;

impl Fetch for StalledFetch {
    fn fetch(&self, _path: &str) -> LocalBoxFuture<'static, Result<FetchResponse, FetchError>> {
        future::pending().boxed_local()
    }
}

fn visit_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

struct Harness {
    program: StepProgram<App>,
    store: Rc<StateStore>,
    kiki: Rc<Kiki>,
    writes: Rc<Cell<usize>>,
}

fn harness(fragment: &str) -> Harness {
    harness_with(fragment, Rc::new(content()))
}

fn harness_with(fragment: &str, fetch: Rc<dyn Fetch>) -> Harness {
    let storage = CountingStorage::default();
    let writes = Rc::clone(&storage.writes);
    let store = Rc::new(StateStore::load(
        Box::new(storage),
        StateStore::DEFAULT_KEY,
    ));
    let clock = SharedClock::new();
    let kiki = Rc::new(Kiki::new(clock.clone()));
    let wall = Rc::new(FixedClock::new(visit_time()));
    let deps = AppDeps::new(Rc::clone(&store), fetch)
        .with_kiki(Rc::clone(&kiki))
        .with_clock(wall);
    let mut program = StepProgram::with_clock(App::new(AppConfig::default(), deps), clock);
    program.init(fragment);
    Harness {
        program,
        store,
        kiki,
        writes,
    }
}

fn lesson_index(h: &Harness) -> usize {
    h.program
        .model()
        .lesson_walker()
        .map(|w| w.position())
        .expect("lesson walker active")
}

#[test]
fn lesson_walk_reaches_quiz_link() {
    let mut h = harness("#/lesson/1");
    assert_eq!(h.program.model().page().name(), "lesson");
    assert_eq!(lesson_index(&h), 0);
    assert_eq!(h.store.current_lesson(), 1);

    for _ in 0..3 {
        h.program.send(Msg::Action(Action::Next));
    }
    h.program.step();

    let Page::Lesson(page) = h.program.model().page() else {
        panic!("expected lesson page");
    };
    assert_eq!(page.index, 3);
    assert_eq!(page.indicator, "4 von 4");
    assert_eq!(
        page.forward,
        Forward::QuizLink {
            href: "/quiz/1".into()
        }
    );
    assert_eq!(h.store.lesson_position(1), Some(3));

    // Next on the last screen stays put.
    h.program.send(Msg::Action(Action::Next));
    assert_eq!(lesson_index(&h), 3);
}

#[test]
fn screen_message_is_spoken_after_delay() {
    let mut h = harness("#/lesson/1");
    assert_eq!(h.kiki.speech(), None);
    h.program.advance_time(Duration::from_millis(299));
    h.program.step();
    assert_eq!(h.kiki.speech(), None);
    h.program.advance_time(Duration::from_millis(1));
    h.program.step();
    assert_eq!(h.kiki.speech().as_deref(), Some("Los geht's!"));
    h.program.advance_time(Duration::from_millis(5000));
    assert_eq!(h.kiki.speech(), None);
}

fn rendered_speech(h: &mut Harness) -> Option<String> {
    h.program
        .take_outputs()
        .last_view
        .and_then(|view| view.mascot)
        .and_then(|mascot| mascot.speech)
}

#[test]
fn expired_screen_message_is_redrawn_away() {
    let mut h = harness("#/lesson/1");
    h.program.advance_time(Duration::from_millis(300));
    assert!(h.program.step().rendered);
    assert_eq!(rendered_speech(&mut h).as_deref(), Some("Los geht's!"));

    h.program.advance_time(Duration::from_millis(4999));
    assert!(!h.program.step().rendered);

    h.program.advance_time(Duration::from_millis(1));
    let result = h.program.step();
    assert!(result.rendered);
    assert_eq!(result.timers_fired, 1);
    assert_eq!(rendered_speech(&mut h), None);
}

#[test]
fn expired_answer_reaction_is_redrawn_away() {
    let mut h = harness("#/quiz/3");
    h.program.send(Msg::Action(Action::Answer(2)));
    h.program.step();
    assert!(rendered_speech(&mut h).is_some());

    // Auto-advance at 2000 ms; the reaction outlives it until 4000 ms.
    h.program.advance_time(Duration::from_millis(2000));
    assert!(h.program.step().rendered);
    assert!(rendered_speech(&mut h).is_some());
    h.program.advance_time(Duration::from_millis(2000));
    assert!(h.program.step().rendered);
    assert_eq!(rendered_speech(&mut h), None);
    assert_eq!(h.kiki.emotion(), Emotion::Thoughtful);
}

#[test]
fn missing_lesson_makes_kiki_sad_for_four_seconds() {
    let mut h = harness("#/lesson/9");
    assert_eq!(h.program.model().page().name(), "error");
    assert_eq!(h.kiki.emotion(), Emotion::Sad);
    assert_eq!(
        h.kiki.speech().as_deref(),
        Some("Oh nein! Die Lektion konnte nicht geladen werden.")
    );

    h.program.advance_time(Duration::from_millis(3999));
    h.program.step();
    assert!(h.kiki.speech().is_some());
    h.program.advance_time(Duration::from_millis(1));
    assert!(h.program.step().rendered);
    assert_eq!(rendered_speech(&mut h), None);
}

#[test]
fn missing_quiz_makes_kiki_sad() {
    let h = harness("#/quiz/9");
    assert_eq!(h.program.model().page().name(), "error");
    assert_eq!(h.kiki.emotion(), Emotion::Sad);
    assert_eq!(
        h.kiki.speech().as_deref(),
        Some("Oh nein! Das Quiz konnte nicht geladen werden.")
    );
}

#[test]
fn kiki_is_curious_while_quiz_loads() {
    let mut h = harness_with("#/quiz/3", Rc::new(StalledFetch));
    let result = h.program.step();
    assert_eq!(result.tasks_pending, 1);
    assert_eq!(h.program.model().page().name(), "loading");
    assert_eq!(h.kiki.emotion(), Emotion::Curious);
}

#[test]
fn home_records_last_visit() {
    let h = harness("#/lesson/1");
    assert_eq!(h.store.last_visited(), None);

    let mut h = harness("#/");
    assert_eq!(h.store.last_visited(), Some(visit_time()));
    h.program.push_event(Event::hash_change("#/apps"));
    h.program.step();
    assert_eq!(h.store.last_visited(), Some(visit_time()));
}

#[test]
fn keys_and_swipes_move_between_screens() {
    let mut h = harness("#/lesson/1");
    h.program.push_event(Event::key(KeyCode::Right));
    h.program.step();
    assert_eq!(lesson_index(&h), 1);

    h.program.push_event(Event::Touch(TouchEvent::start(300.0)));
    h.program.push_event(Event::Touch(TouchEvent::end(200.0)));
    h.program.step();
    assert_eq!(lesson_index(&h), 2);

    h.program.push_event(Event::key(KeyCode::Left));
    h.program.step();
    assert_eq!(lesson_index(&h), 1);
}

#[test]
fn lesson_position_is_restored_on_return() {
    let mut h = harness("#/lesson/1");
    h.program.send(Msg::Action(Action::GoTo(2)));
    h.program.push_event(Event::hash_change("#/"));
    h.program.step();
    h.program.push_event(Event::hash_change("#/lesson/1"));
    h.program.step();
    assert_eq!(lesson_index(&h), 2);
}

#[test]
fn perfect_quiz_completes_lesson() {
    let mut h = harness("#/quiz/3");
    assert_eq!(h.program.model().page().name(), "quiz");
    let auto_advance = Duration::from_millis(AppConfig::default().auto_advance_ms);

    for pick in [0, 1, 0, 2, 1] {
        h.program.send(Msg::Action(Action::Answer(pick)));
        assert_eq!(h.kiki.emotion(), Emotion::Proud);
        h.program.advance_time(auto_advance);
        h.program.step();
    }

    let Page::Quiz(QuizPage::Results(results)) = h.program.model().page() else {
        panic!("expected quiz results");
    };
    assert_eq!(results.score, 5);
    assert_eq!(results.total, 5);
    assert_eq!(results.lesson_id, 3);
    assert_eq!(results.tier, ResultTier::Perfect);

    assert!(h.store.is_lesson_completed(3));
    let saved = h.store.quiz_score(3).expect("score recorded");
    assert_eq!((saved.score, saved.total), (5, 5));
    assert_eq!(
        h.kiki.speech().as_deref(),
        Some("Super! Du hast 5 von 5 richtig!")
    );
}

#[test]
fn leaving_quiz_drops_pending_advance() {
    let mut h = harness("#/quiz/3");
    h.program.send(Msg::Action(Action::Answer(2)));
    assert_eq!(h.kiki.emotion(), Emotion::Thoughtful);
    h.program.push_event(Event::hash_change("#/apps"));
    h.program.step();
    h.program.advance_time(Duration::from_secs(10));
    h.program.step();
    assert_eq!(h.program.model().page().name(), "apps");
    assert!(h.store.quiz_score(3).is_none());
}

#[test]
fn unknown_path_renders_not_found_without_writes() {
    let h = harness("#/unknown/path");
    let Page::NotFound(view) = h.program.model().page() else {
        panic!("expected not-found page");
    };
    assert_eq!(view.heading, "404");
    assert_eq!(h.writes.get(), 0);
}

#[test]
fn lesson_listener_is_released_on_navigation() {
    let mut h = harness("#/lesson/1");
    let listeners = Rc::clone(h.program.model().listeners());
    assert_eq!(listeners.borrow().count(ListenerKind::Keyboard), 1);

    h.program.push_event(Event::hash_change("#/"));
    h.program.step();
    assert_eq!(listeners.borrow().count(ListenerKind::Keyboard), 0);

    for _ in 0..3 {
        h.program.push_event(Event::hash_change("#/lesson/1"));
        h.program.step();
        h.program.push_event(Event::hash_change("#/teacher"));
        h.program.step();
    }
    assert_eq!(listeners.borrow().count(ListenerKind::Keyboard), 0);
}

#[test]
fn reset_returns_home_after_delay() {
    let mut h = harness("#/quiz/3");
    for pick in [0, 1, 0, 2, 1] {
        h.program.send(Msg::Action(Action::Answer(pick)));
        h.program.run_for(Duration::from_millis(2000), Duration::from_millis(500));
    }
    assert!(h.store.is_lesson_completed(3));

    h.program.push_event(Event::hash_change("#/teacher"));
    h.program.step();
    h.program.send(Msg::Action(Action::ResetProgress));
    assert!(!h.store.is_lesson_completed(3));
    assert_eq!(h.kiki.emotion(), Emotion::Surprised);

    h.program.advance_time(Duration::from_millis(1500));
    h.program.step();
    assert_eq!(h.program.model().path(), "/");
    assert_eq!(h.program.location().fragment(), "#/");
    assert_eq!(h.program.model().page().name(), "home");
}

#[test]
fn greeting_plays_once_per_session() {
    let mut h = harness("#/");
    h.program.advance_time(Duration::from_millis(500));
    h.program.step();
    let greeting = h.kiki.speech().expect("greeting spoken");
    assert!(greeting.starts_with("Hallo! Ich bin Kiki"));

    h.kiki.hide_speech();
    h.program.push_event(Event::hash_change("#/apps"));
    h.program.step();
    h.kiki.hide_speech();
    h.program.push_event(Event::hash_change("#/"));
    h.program.step();
    h.program.advance_time(Duration::from_millis(500));
    h.program.step();
    assert_eq!(h.kiki.speech(), None);
}
