#![forbid(unsafe_code)]

//! Typed lesson and quiz descriptors.
//!
//! Descriptors are decoded only after the raw JSON passed structural
//! validation (see [`crate::validate`]), so field-level `serde` defaults here
//! cover optional presentation fields, never the required skeleton.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validate::{self, ValidationError};

/// Number of questions every quiz carries.
pub const QUIZ_QUESTION_COUNT: usize = 5;
/// Inclusive bounds on screens per lesson.
pub const LESSON_SCREENS_MIN: usize = 1;
pub const LESSON_SCREENS_MAX: usize = 10;
/// Inclusive bounds on answers per question.
pub const ANSWERS_MIN: usize = 2;
pub const ANSWERS_MAX: usize = 4;

/// Which kind of content a loader deals with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Lesson,
    Quiz,
}

impl ContentKind {
    /// User-facing noun used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lesson => "Lektion",
            Self::Quiz => "Quiz",
        }
    }

    /// Conventional document path template (`{id}` is substituted).
    #[must_use]
    pub const fn default_template(self) -> &'static str {
        match self {
            Self::Lesson => "./src/data/lessons/lesson-{id}.json",
            Self::Quiz => "./src/data/quizzes/quiz-{id}.json",
        }
    }
}

/// A validated document that a [`ContentLoader`](crate::loader::ContentLoader) can produce.
pub trait Descriptor: serde::de::DeserializeOwned + 'static {
    /// Content kind, used for paths and messages.
    const KIND: ContentKind;

    /// Structural check on the raw decoded payload.
    fn validate(raw: &Value) -> Result<(), ValidationError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Lessons
// ─────────────────────────────────────────────────────────────────────────────

/// One lesson: a titled, ordered run of screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDescriptor {
    pub id: u32,
    pub title: String,
    pub screens: Vec<Screen>,
}

impl LessonDescriptor {
    /// Number of screens (always within 1..=10 once validated).
    #[must_use]
    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }
}

impl Descriptor for LessonDescriptor {
    const KIND: ContentKind = ContentKind::Lesson;

    fn validate(raw: &Value) -> Result<(), ValidationError> {
        validate::lesson(raw)
    }
}

/// Presentation kind of a lesson screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenKind {
    Intro,
    Explanation,
    Example,
    Interactive,
    Summary,
    /// A type string this build does not know; rendered by a generic fallback.
    #[serde(other)]
    Unknown,
}

/// A single lesson screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    #[serde(rename = "type")]
    pub kind: ScreenKind,
    pub content: ScreenContent,
    /// Mascot emotion tag to show while this screen is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kiki_emotion: Option<String>,
    /// Message the mascot says shortly after the screen appears.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kiki_message: Option<String>,
}

/// Free-form screen content with typed accessors for the known fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenContent(Map<String, Value>);

/// A titled example card on an example screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleCard {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ScreenContent {
    /// Wrap an already-decoded JSON object.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Raw JSON fields.
    #[must_use]
    pub fn raw(&self) -> &Map<String, Value> {
        &self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    fn str_list(&self, key: &str) -> Vec<&str> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn headline(&self) -> Option<&str> {
        self.str_field("headline")
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.str_field("text")
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.str_field("image")
    }

    #[must_use]
    pub fn highlight(&self) -> Option<&str> {
        self.str_field("highlight")
    }

    #[must_use]
    pub fn next_step(&self) -> Option<&str> {
        self.str_field("nextStep")
    }

    #[must_use]
    pub fn bullets(&self) -> Vec<&str> {
        self.str_list("bullets")
    }

    #[must_use]
    pub fn summary(&self) -> Vec<&str> {
        self.str_list("summary")
    }

    /// Example cards; malformed entries are skipped.
    #[must_use]
    pub fn examples(&self) -> Vec<ExampleCard> {
        self.0
            .get("examples")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Interaction payload of an interactive screen, passed through untouched.
    #[must_use]
    pub fn interaction(&self) -> Option<&Value> {
        self.0.get("interaction")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Quizzes
// ─────────────────────────────────────────────────────────────────────────────

/// The quiz that closes a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDescriptor {
    pub lesson_id: u32,
    pub title: String,
    pub questions: Vec<Question>,
}

impl QuizDescriptor {
    /// Number of questions (always 5 once validated).
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

impl Descriptor for QuizDescriptor {
    const KIND: ContentKind = ContentKind::Quiz;

    fn validate(raw: &Value) -> Result<(), ValidationError> {
        validate::quiz(raw)
    }
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub answers: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub feedback: Feedback,
}

impl Question {
    /// Whether `selected` is the correct answer.
    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_index
    }

    /// Feedback text for a correct or incorrect pick.
    #[must_use]
    pub fn feedback_for(&self, correct: bool) -> &str {
        if correct {
            &self.feedback.correct
        } else {
            &self.feedback.incorrect
        }
    }
}

/// Feedback texts shown after answering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub correct: String,
    #[serde(default)]
    pub incorrect: String,
}
