#![forbid(unsafe_code)]

//! Structural validation of raw lesson and quiz payloads.
//!
//! Validation runs on the decoded JSON value before typed decoding so that
//! authors get a message naming the offending screen or question rather than a
//! generic serde path. Required scalar fields follow truthiness rules: `0`,
//! `""`, `false` and `null` all count as missing.

use std::fmt;

use serde_json::Value;

use crate::descriptor::{
    ANSWERS_MAX, ANSWERS_MIN, LESSON_SCREENS_MAX, LESSON_SCREENS_MIN, QUIZ_QUESTION_COUNT,
};

/// A structural defect in a content document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Lesson lacks `id`, `title`, or a `screens` array.
    LessonShape,
    /// Lesson screen count outside 1..=10.
    ScreenCount(usize),
    /// Screen (1-based) lacks `type` or `content`.
    ScreenIncomplete(usize),
    /// Quiz lacks `lessonId`, `title`, or a `questions` array.
    QuizShape,
    /// Quiz question count is not exactly 5.
    QuestionCount(usize),
    /// Question (1-based) lacks `question`, `answers`, or `correctIndex`.
    QuestionIncomplete(usize),
    /// Question (1-based) has an answer count outside 2..=4.
    AnswerCount { question: usize, answers: usize },
    /// Question (1-based) has a `correctIndex` outside its answers.
    CorrectIndex(usize),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LessonShape => write!(f, "Ungültige Lektionsstruktur"),
            Self::ScreenCount(n) => write!(
                f,
                "Lektion hat {n} Bildschirme (erwartet {LESSON_SCREENS_MIN}-{LESSON_SCREENS_MAX})"
            ),
            Self::ScreenIncomplete(n) => write!(f, "Bildschirm {n} fehlt type oder content"),
            Self::QuizShape => write!(f, "Ungültige Quiz-Struktur"),
            Self::QuestionCount(n) => {
                write!(f, "Quiz hat {n} Fragen (erwartet {QUIZ_QUESTION_COUNT})")
            }
            Self::QuestionIncomplete(n) => {
                write!(f, "Frage {n} fehlt question, answers oder correctIndex")
            }
            Self::AnswerCount { question, answers } => write!(
                f,
                "Frage {question} hat {answers} Antworten (erwartet {ANSWERS_MIN}-{ANSWERS_MAX})"
            ),
            Self::CorrectIndex(n) => write!(f, "Frage {n} hat ungültigen correctIndex"),
        }
    }
}

impl std::error::Error for ValidationError {}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Validate a raw lesson document.
pub fn lesson(raw: &Value) -> Result<(), ValidationError> {
    let screens = match raw.get("screens").and_then(Value::as_array) {
        Some(screens) if truthy(raw.get("id")) && truthy(raw.get("title")) => screens,
        _ => return Err(ValidationError::LessonShape),
    };

    if !(LESSON_SCREENS_MIN..=LESSON_SCREENS_MAX).contains(&screens.len()) {
        return Err(ValidationError::ScreenCount(screens.len()));
    }

    for (index, screen) in screens.iter().enumerate() {
        if !truthy(screen.get("type")) || !truthy(screen.get("content")) {
            return Err(ValidationError::ScreenIncomplete(index + 1));
        }
    }
    Ok(())
}

/// Validate a raw quiz document.
pub fn quiz(raw: &Value) -> Result<(), ValidationError> {
    let questions = match raw.get("questions").and_then(Value::as_array) {
        Some(questions) if truthy(raw.get("lessonId")) && truthy(raw.get("title")) => questions,
        _ => return Err(ValidationError::QuizShape),
    };

    if questions.len() != QUIZ_QUESTION_COUNT {
        return Err(ValidationError::QuestionCount(questions.len()));
    }

    for (index, question) in questions.iter().enumerate() {
        let number = index + 1;
        let answers = question.get("answers").and_then(Value::as_array);
        let correct = question.get("correctIndex");
        let (Some(answers), Some(correct)) = (answers, correct) else {
            return Err(ValidationError::QuestionIncomplete(number));
        };
        if !truthy(question.get("question")) || correct.is_null() {
            return Err(ValidationError::QuestionIncomplete(number));
        }

        if !(ANSWERS_MIN..=ANSWERS_MAX).contains(&answers.len()) {
            return Err(ValidationError::AnswerCount {
                question: number,
                answers: answers.len(),
            });
        }

        let in_bounds = correct
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .is_some_and(|i| i < answers.len());
        if !in_bounds {
            return Err(ValidationError::CorrectIndex(number));
        }
    }
    Ok(())
}
