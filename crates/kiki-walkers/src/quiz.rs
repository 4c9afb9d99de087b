#![forbid(unsafe_code)]

//! Question walker: runs one quiz from the first question to the results.
//!
//! # State Machine
//!
//! ```text
//!   (i, unanswered) --answer--> (i, answered) --auto-advance--> (i+1, unanswered)
//!                                                    │
//!                                         i+1 == count ▼
//!                                                 Results --restart--> (0, unanswered)
//! ```
//!
//! Answering emits a `quiz-answer` event and arms the auto-advance timer.
//! Entering Results persists the score, marks the lesson completed on a pass,
//! and emits `quiz-complete`.

use std::rc::Rc;

use kiki_content::QuizDescriptor;
use kiki_runtime::scheduler::{Generation, GenerationCounter};
use serde::Serialize;

use crate::context::{Deferred, DeferredAction, WalkerContext};

/// Minimum score that completes a lesson.
pub const PASS_THRESHOLD: u32 = 3;

/// Result banding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultTier {
    /// Every answer correct.
    Perfect,
    /// At least four correct.
    Great,
    /// Passed.
    Passed,
    /// Below the pass threshold.
    Retry,
}

impl ResultTier {
    /// Band `score` out of `total`.
    #[must_use]
    pub fn for_score(score: u32, total: u32) -> Self {
        if score == total {
            Self::Perfect
        } else if score >= 4 {
            Self::Great
        } else if score >= PASS_THRESHOLD {
            Self::Passed
        } else {
            Self::Retry
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Perfect => "Perfekt! Alle Fragen richtig!",
            Self::Great => "Super gemacht!",
            Self::Passed => "Gut gemacht!",
            Self::Retry => "Das war schon gut! Versuch es nochmal!",
        }
    }

    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Perfect => "🌟",
            Self::Great => "🎉",
            Self::Passed => "👍",
            Self::Retry => "💪",
        }
    }
}

/// One logged answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_index: usize,
    pub selected_index: usize,
    pub is_correct: bool,
}

/// Lifecycle events scoped to the quiz container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum QuizEvent {
    #[serde(rename = "quiz-answer")]
    Answer {
        is_correct: bool,
        question_index: usize,
    },
    #[serde(rename = "quiz-complete")]
    Complete {
        score: u32,
        total: u32,
        lesson_id: u32,
    },
}

/// Effects produced by one walker transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizStep {
    pub deferred: Vec<Deferred>,
    pub events: Vec<QuizEvent>,
}

impl QuizStep {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deferred.is_empty() && self.events.is_empty()
    }
}

/// Visual state of one answer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMark {
    Neutral,
    Correct,
    Incorrect,
}

/// One answer button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOption {
    /// `A`..`D`.
    pub letter: char,
    pub text: String,
    pub mark: AnswerMark,
    pub disabled: bool,
}

/// Feedback line shown after answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackLine {
    pub is_correct: bool,
    pub text: String,
}

/// A question being asked or just answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPage {
    pub title: String,
    /// 1-based question number.
    pub number: usize,
    pub total: usize,
    pub progress: f64,
    /// "Frage 2 von 5".
    pub progress_text: String,
    pub question: String,
    pub answers: Vec<AnswerOption>,
    pub feedback: Option<FeedbackLine>,
}

/// The terminal results screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsPage {
    pub title: String,
    pub lesson_id: u32,
    pub score: u32,
    pub total: u32,
    pub tier: ResultTier,
    pub message: String,
    pub emoji: String,
    pub passed: bool,
    /// "von 5 richtig".
    pub score_text: String,
    pub retry_label: String,
    pub home_href: String,
    pub home_label: String,
}

/// Page model for the quiz container.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum QuizPage {
    Question(QuestionPage),
    Results(ResultsPage),
}

/// Position summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizProgress {
    /// 1-based question number (count + 1 in Results).
    pub current: usize,
    pub total: usize,
    pub score: u32,
}

/// Quiz state machine bound to one navigation.
pub struct QuizWalker {
    quiz: Rc<QuizDescriptor>,
    ctx: WalkerContext,
    question_index: usize,
    selected: Option<usize>,
    score: u32,
    log: Vec<AnswerRecord>,
    generation: GenerationCounter,
}

impl QuizWalker {
    #[must_use]
    pub fn new(quiz: Rc<QuizDescriptor>, ctx: WalkerContext) -> Self {
        Self {
            quiz,
            ctx,
            question_index: 0,
            selected: None,
            score: 0,
            log: Vec::new(),
            generation: GenerationCounter::new(),
        }
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizDescriptor {
        &self.quiz
    }

    #[must_use]
    pub fn lesson_id(&self) -> u32 {
        self.quiz.lesson_id
    }

    #[must_use]
    pub fn question_index(&self) -> usize {
        self.question_index
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Ordered answer log.
    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.log
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.quiz.question_count()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn is_results(&self) -> bool {
        self.question_index >= self.quiz.question_count()
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation.current()
    }

    /// Choose answer `selected` for the current question.
    ///
    /// No-op when the question is already answered, when in Results, or when
    /// `selected` names no answer.
    pub fn answer(&mut self, selected: usize) -> QuizStep {
        if self.selected.is_some() || self.is_results() {
            return QuizStep::default();
        }
        let question = &self.quiz.questions[self.question_index];
        if selected >= question.answers.len() {
            kiki_core::debug!(selected, "ignoring out-of-range answer");
            return QuizStep::default();
        }

        let is_correct = question.is_correct(selected);
        self.selected = Some(selected);
        if is_correct {
            self.score += 1;
        }
        self.log.push(AnswerRecord {
            question_index: self.question_index,
            selected_index: selected,
            is_correct,
        });

        QuizStep {
            deferred: vec![Deferred {
                delay: self.ctx.timing.auto_advance,
                generation: self.generation.current(),
                action: DeferredAction::AutoAdvance,
            }],
            events: vec![QuizEvent::Answer {
                is_correct,
                question_index: self.question_index,
            }],
        }
    }

    /// Move past the answered question. Entering Results persists the score
    /// and emits the completion event.
    pub fn advance(&mut self) -> QuizStep {
        if self.is_results() {
            return QuizStep::default();
        }
        self.question_index += 1;
        self.selected = None;
        if self.is_results() {
            return self.enter_results();
        }
        QuizStep::default()
    }

    fn enter_results(&mut self) -> QuizStep {
        let total = self.total();
        let lesson_id = self.quiz.lesson_id;
        let store = &self.ctx.store;
        store.record_quiz_result(lesson_id, self.score, total, self.ctx.clock.now_utc());
        if self.score >= PASS_THRESHOLD {
            store.mark_lesson_completed(lesson_id);
        }
        QuizStep {
            deferred: Vec::new(),
            events: vec![QuizEvent::Complete {
                score: self.score,
                total,
                lesson_id,
            }],
        }
    }

    /// Execute a delayed effect armed by this walker. Stale effects and
    /// effects not meant for a quiz produce nothing.
    pub fn fire(&mut self, deferred: Deferred) -> QuizStep {
        if !self.generation.is_current(deferred.generation) {
            kiki_core::trace!(lesson = self.quiz.lesson_id, "dropping stale quiz effect");
            return QuizStep::default();
        }
        match deferred.action {
            DeferredAction::AutoAdvance if self.selected.is_some() => self.advance(),
            _ => QuizStep::default(),
        }
    }

    /// Reset every field and start again at question 0.
    pub fn restart(&mut self) {
        self.question_index = 0;
        self.selected = None;
        self.score = 0;
        self.log.clear();
        self.generation.bump();
    }

    /// Invalidate any pending auto-advance.
    pub fn destroy(&mut self) {
        self.generation.bump();
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            current: self.question_index + 1,
            total: self.quiz.question_count(),
            score: self.score,
        }
    }

    /// Results page, once the quiz is finished.
    #[must_use]
    pub fn results(&self) -> Option<ResultsPage> {
        if !self.is_results() {
            return None;
        }
        let total = self.total();
        let tier = ResultTier::for_score(self.score, total);
        Some(ResultsPage {
            title: self.quiz.title.clone(),
            lesson_id: self.quiz.lesson_id,
            score: self.score,
            total,
            tier,
            message: tier.message().to_owned(),
            emoji: tier.emoji().to_owned(),
            passed: self.score >= PASS_THRESHOLD,
            score_text: format!("von {total} richtig"),
            retry_label: "Nochmal versuchen".to_owned(),
            home_href: "/".to_owned(),
            home_label: "Zur Übersicht".to_owned(),
        })
    }

    /// Page model for the current state.
    #[must_use]
    pub fn page(&self) -> QuizPage {
        if let Some(results) = self.results() {
            return QuizPage::Results(results);
        }
        let question = &self.quiz.questions[self.question_index];
        let total = self.quiz.question_count();
        let answers = question
            .answers
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let mark = match self.selected {
                    Some(sel) if i == sel && question.is_correct(sel) => AnswerMark::Correct,
                    Some(sel) if i == sel => AnswerMark::Incorrect,
                    Some(_) if question.is_correct(i) => AnswerMark::Correct,
                    _ => AnswerMark::Neutral,
                };
                AnswerOption {
                    letter: answer_letter(i),
                    text: text.clone(),
                    mark,
                    disabled: self.selected.is_some(),
                }
            })
            .collect();
        let feedback = self.selected.map(|sel| {
            let is_correct = question.is_correct(sel);
            FeedbackLine {
                is_correct,
                text: question.feedback_for(is_correct).to_owned(),
            }
        });
        QuizPage::Question(QuestionPage {
            title: self.quiz.title.clone(),
            number: self.question_index + 1,
            total,
            progress: (self.question_index + 1) as f64 / total as f64,
            progress_text: format!("Frage {} von {}", self.question_index + 1, total),
            question: question.question.clone(),
            answers,
            feedback,
        })
    }
}

/// Button letter for answer `index` (`A` for 0).
#[must_use]
pub fn answer_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .and_then(|i| b'A'.checked_add(i))
        .map_or('?', char::from)
}

impl std::fmt::Debug for QuizWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizWalker")
            .field("lesson", &self.quiz.lesson_id)
            .field("question_index", &self.question_index)
            .field("answered", &self.selected.is_some())
            .field("score", &self.score)
            .field("generation", &self.generation.current())
            .finish()
    }
}
