#![forbid(unsafe_code)]

//! Screen walker: steps through the screens of one lesson.
//!
//! The walker owns a position in `[0, screen_count)`, restored from the store
//! on construction. Every render persists the position and drives the mascot
//! side channel (emotion now, message after a short delay). On the last
//! screen the forward affordance becomes a link to the lesson's quiz.

use std::rc::Rc;

use kiki_content::{LessonDescriptor, Screen};
use kiki_core::event::{KeyCode, KeyEvent, TouchEvent};
use kiki_core::gesture::{Swipe, SwipeRecognizer};
use kiki_runtime::listeners::{ListenerId, ListenerKind};
use kiki_runtime::scheduler::{Generation, GenerationCounter};
use serde::Serialize;

use crate::context::{Deferred, DeferredAction, WalkerContext};
use crate::mascot::{self, SpeakOptions};

/// What the forward control does on the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Forward {
    /// Advance to the next screen in place.
    Next,
    /// Navigate to the lesson's quiz.
    QuizLink { href: String },
}

/// Position summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// 1-based screen number.
    pub current: usize,
    pub total: usize,
    pub percentage: u32,
}

/// Everything a host needs to draw the current lesson screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPage {
    pub lesson_id: u32,
    pub title: String,
    /// `None` only for a descriptor without screens.
    pub screen: Option<Screen>,
    pub index: usize,
    pub total: usize,
    /// `(index + 1) / total`, or 0 without screens.
    pub progress: f64,
    pub percentage: u32,
    /// "2 von 5".
    pub indicator: String,
    pub back_enabled: bool,
    pub forward: Forward,
}

/// Path of the quiz that follows `lesson_id`.
#[must_use]
pub fn quiz_path(lesson_id: u32) -> String {
    format!("/quiz/{lesson_id}")
}

/// Lesson state machine bound to one navigation.
pub struct LessonWalker {
    lesson: Rc<LessonDescriptor>,
    position: usize,
    ctx: WalkerContext,
    generation: GenerationCounter,
    swipe: SwipeRecognizer,
    keyboard: Option<ListenerId>,
}

impl LessonWalker {
    /// Bind a walker to `lesson`, restoring the remembered position and
    /// attaching its keyboard listener.
    #[must_use]
    pub fn new(lesson: Rc<LessonDescriptor>, ctx: WalkerContext) -> Self {
        let position = ctx
            .store
            .lesson_position(lesson.id)
            .filter(|p| *p < lesson.screen_count())
            .unwrap_or(0);
        let keyboard = Some(ctx.listeners.borrow_mut().attach(ListenerKind::Keyboard));
        Self {
            lesson,
            position,
            ctx,
            generation: GenerationCounter::new(),
            swipe: SwipeRecognizer::default(),
            keyboard,
        }
    }

    /// Use a custom swipe threshold in pixels.
    #[must_use]
    pub fn with_swipe_threshold(mut self, threshold: f64) -> Self {
        self.swipe = SwipeRecognizer::new(threshold);
        self
    }

    #[must_use]
    pub fn lesson(&self) -> &LessonDescriptor {
        &self.lesson
    }

    #[must_use]
    pub fn lesson_id(&self) -> u32 {
        self.lesson.id
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn screen_count(&self) -> usize {
        self.lesson.screen_count()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.position + 1 >= self.screen_count()
    }

    /// Token carried by effects armed now.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation.current()
    }

    /// Whether the keyboard listener is attached.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.keyboard.is_some()
    }

    /// Page model for the current screen.
    #[must_use]
    pub fn page(&self) -> LessonPage {
        let total = self.screen_count();
        let progress = self.progress();
        let forward = if self.is_last() {
            Forward::QuizLink {
                href: quiz_path(self.lesson.id),
            }
        } else {
            Forward::Next
        };
        LessonPage {
            lesson_id: self.lesson.id,
            title: self.lesson.title.clone(),
            screen: self.lesson.screens.get(self.position).cloned(),
            index: self.position,
            total,
            progress: if total == 0 {
                0.0
            } else {
                progress.current as f64 / total as f64
            },
            percentage: progress.percentage,
            indicator: format!("{} von {}", progress.current, total),
            back_enabled: self.position > 0,
            forward,
        }
    }

    /// Run the render side effects for the current screen: mascot emotion,
    /// delayed mascot message, and position persistence.
    pub fn render(&mut self) -> Vec<Deferred> {
        let Some(screen) = self.lesson.screens.get(self.position) else {
            return Vec::new();
        };
        let mut deferred = Vec::new();

        if self.ctx.mascot.is_some() {
            if let Some(tag) = screen.kiki_emotion.as_deref().filter(|t| !t.is_empty()) {
                mascot::set_emotion_tag(&self.ctx.mascot, tag);
            }
            if let Some(text) = screen.kiki_message.as_deref().filter(|t| !t.is_empty()) {
                deferred.push(Deferred {
                    delay: self.ctx.timing.speech_delay,
                    generation: self.generation.current(),
                    action: DeferredAction::Speak {
                        text: text.to_owned(),
                        duration: self.ctx.timing.speech_duration,
                    },
                });
            }
        }

        self.ctx
            .store
            .set_lesson_position(self.lesson.id, self.position);
        deferred
    }

    /// Advance one screen. No-op on the last screen.
    pub fn next(&mut self) -> Vec<Deferred> {
        if self.is_last() {
            return Vec::new();
        }
        self.position += 1;
        self.render()
    }

    /// Go back one screen. No-op on the first screen.
    pub fn prev(&mut self) -> Vec<Deferred> {
        if self.position == 0 {
            return Vec::new();
        }
        self.position -= 1;
        self.render()
    }

    /// Jump to `index`. No-op when out of range.
    pub fn go_to(&mut self, index: usize) -> Vec<Deferred> {
        if index >= self.screen_count() {
            return Vec::new();
        }
        self.position = index;
        self.render()
    }

    /// Arrow keys move between screens while the listener is attached.
    pub fn handle_key(&mut self, key: &KeyEvent) -> Vec<Deferred> {
        if self.keyboard.is_none() || !key.is_actionable() {
            return Vec::new();
        }
        match key.code {
            KeyCode::Right => self.next(),
            KeyCode::Left => self.prev(),
            _ => Vec::new(),
        }
    }

    /// Feed a touch event; a completed swipe moves between screens.
    pub fn handle_touch(&mut self, touch: TouchEvent) -> Vec<Deferred> {
        match self.swipe.feed(touch) {
            Some(Swipe::Left) => self.next(),
            Some(Swipe::Right) => self.prev(),
            None => Vec::new(),
        }
    }

    /// Execute a delayed effect armed by this walker. Returns `false` when
    /// the effect is stale or not meant for a lesson.
    pub fn fire(&mut self, deferred: Deferred) -> bool {
        if !self.generation.is_current(deferred.generation) {
            kiki_core::trace!(
                lesson = self.lesson.id,
                "dropping stale lesson effect"
            );
            return false;
        }
        match deferred.action {
            DeferredAction::Speak { text, duration } => {
                mascot::speak(&self.ctx.mascot, &text, SpeakOptions::for_duration(duration));
                true
            }
            DeferredAction::AutoAdvance => false,
        }
    }

    /// 1-based position summary.
    #[must_use]
    pub fn progress(&self) -> Progress {
        let total = self.screen_count();
        if total == 0 {
            return Progress {
                current: 0,
                total,
                percentage: 0,
            };
        }
        let current = self.position + 1;
        let percentage = ((current as f64 / total as f64) * 100.0).round() as u32;
        Progress {
            current,
            total,
            percentage,
        }
    }

    /// Detach the keyboard listener and invalidate pending effects.
    /// Safe to call more than once.
    pub fn destroy(&mut self) {
        if let Some(id) = self.keyboard.take() {
            self.ctx.listeners.borrow_mut().detach(id);
        }
        self.swipe.reset();
        self.generation.bump();
    }
}

impl Drop for LessonWalker {
    fn drop(&mut self) {
        if let Some(id) = self.keyboard.take() {
            self.ctx.listeners.borrow_mut().detach(id);
        }
    }
}

impl std::fmt::Debug for LessonWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonWalker")
            .field("lesson", &self.lesson.id)
            .field("position", &self.position)
            .field("generation", &self.generation.current())
            .field("listening", &self.keyboard.is_some())
            .finish()
    }
}
