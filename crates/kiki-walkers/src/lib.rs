#![forbid(unsafe_code)]

//! Screen and question walkers for the KI und ich app.
//!
//! Walkers are plain state machines. Delayed effects come back to the host as
//! [`Deferred`] values; the host arms a timer and hands each one back through
//! the walker's `fire` method. Tearing a walker down bumps its generation so
//! effects armed before the teardown are dropped.

pub mod context;
pub mod lesson;
pub mod mascot;
pub mod quiz;

pub use context::{Deferred, DeferredAction, WalkerContext, WalkerTiming};
pub use lesson::{Forward, LessonPage, LessonWalker, Progress, quiz_path};
pub use mascot::{
    Emotion, Mascot, MascotCall, MascotHandle, RecordingMascot, SpeakOptions, UnknownEmotion,
};
pub use quiz::{
    AnswerMark, AnswerOption, AnswerRecord, FeedbackLine, PASS_THRESHOLD, QuestionPage,
    QuizEvent, QuizPage, QuizProgress, QuizStep, QuizWalker, ResultTier, ResultsPage,
};
