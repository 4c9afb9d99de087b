#![forbid(unsafe_code)]

//! Kiki, the default mascot model.
//!
//! Kiki keeps the emotion and the speech bubble the host draws. A bubble
//! spoken with a duration disappears once the shared host clock passes its
//! expiry; without a duration it stays until replaced. [`Kiki::take_expiry`]
//! hands each timed bubble's remaining time to the app once, so the app can
//! schedule the render that removes it.

use std::cell::RefCell;
use std::time::Duration;

use kiki_core::clock::{MonotonicClock, SharedClock};
use kiki_walkers::PASS_THRESHOLD;
use kiki_walkers::mascot::{Emotion, Mascot, SpeakOptions};
use serde::Serialize;

const CORRECT_MESSAGES: [&str; 4] = ["Super gemacht!", "Toll!", "Richtig!", "Genau!"];

const INCORRECT_MESSAGES: [&str; 4] = [
    "Kein Problem, versuch es nochmal!",
    "Fast! Probier nochmal!",
    "Hmm, nicht ganz. Noch ein Versuch!",
    "Das ist knifflig! Versuch es nochmal!",
];

const CORRECT_SPEECH: Duration = Duration::from_millis(3000);
const INCORRECT_SPEECH: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone)]
struct Bubble {
    text: String,
    shown_at: Duration,
    duration: Option<Duration>,
    expiry_taken: bool,
}

#[derive(Debug)]
struct KikiState {
    emotion: Emotion,
    bubble: Option<Bubble>,
    correct_turn: usize,
    incorrect_turn: usize,
}

/// What the host draws for the mascot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MascotView {
    pub emotion: Emotion,
    pub speech: Option<String>,
}

/// The default mascot.
#[derive(Debug)]
pub struct Kiki {
    clock: SharedClock,
    state: RefCell<KikiState>,
}

impl Kiki {
    /// A happy, silent Kiki reading time from `clock`.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            state: RefCell::new(KikiState {
                emotion: Emotion::Happy,
                bubble: None,
                correct_turn: 0,
                incorrect_turn: 0,
            }),
        }
    }

    #[must_use]
    pub fn emotion(&self) -> Emotion {
        self.state.borrow().emotion
    }

    /// The visible speech text, if the bubble has not expired.
    #[must_use]
    pub fn speech(&self) -> Option<String> {
        let now = self.clock.now_mono();
        let state = self.state.borrow();
        let bubble = state.bubble.as_ref()?;
        match bubble.duration {
            Some(d) if now >= bubble.shown_at.saturating_add(d) => None,
            _ => Some(bubble.text.clone()),
        }
    }

    /// Time left on a timed bubble not yet reported by a previous call.
    ///
    /// Returns `None` for untimed bubbles and for bubbles already reported.
    pub fn take_expiry(&self) -> Option<Duration> {
        let now = self.clock.now_mono();
        let mut state = self.state.borrow_mut();
        let bubble = state.bubble.as_mut()?;
        let duration = bubble.duration?;
        if bubble.expiry_taken {
            return None;
        }
        bubble.expiry_taken = true;
        Some(bubble.shown_at.saturating_add(duration).saturating_sub(now))
    }

    /// Hide the bubble now.
    pub fn hide_speech(&self) {
        self.state.borrow_mut().bubble = None;
    }

    #[must_use]
    pub fn view(&self) -> MascotView {
        MascotView {
            emotion: self.emotion(),
            speech: self.speech(),
        }
    }

    fn say(&self, text: &str, duration: Option<Duration>) {
        self.state.borrow_mut().bubble = Some(Bubble {
            text: text.to_owned(),
            shown_at: self.clock.now_mono(),
            duration,
            expiry_taken: false,
        });
    }

    fn next_message(&self, correct: bool) -> &'static str {
        let mut state = self.state.borrow_mut();
        if correct {
            let msg = CORRECT_MESSAGES[state.correct_turn % CORRECT_MESSAGES.len()];
            state.correct_turn += 1;
            msg
        } else {
            let msg = INCORRECT_MESSAGES[state.incorrect_turn % INCORRECT_MESSAGES.len()];
            state.incorrect_turn += 1;
            msg
        }
    }
}

impl Mascot for Kiki {
    fn set_emotion(&self, emotion: Emotion) {
        self.state.borrow_mut().emotion = emotion;
    }

    fn speak(&self, text: &str, options: SpeakOptions) {
        self.say(text, options.duration.filter(|d| !d.is_zero()));
    }

    fn react_to_answer(&self, is_correct: bool) {
        let text = self.next_message(is_correct);
        if is_correct {
            self.set_emotion(Emotion::Proud);
            self.say(text, Some(CORRECT_SPEECH));
        } else {
            self.set_emotion(Emotion::Thoughtful);
            self.say(text, Some(INCORRECT_SPEECH));
        }
    }

    fn react_to_quiz_end(&self, score: u32, total: u32) {
        if score >= PASS_THRESHOLD {
            self.set_emotion(Emotion::Proud);
            self.say(&format!("Super! Du hast {score} von {total} richtig!"), None);
        } else {
            self.set_emotion(Emotion::Thoughtful);
            self.say("Das war schon gut! Versuch die Lektion nochmal!", None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bubble_expires_with_the_clock() {
        let clock = SharedClock::new();
        let kiki = Kiki::new(clock.clone());
        kiki.speak("Hallo", SpeakOptions::for_duration(Duration::from_millis(4000)));
        clock.advance(Duration::from_millis(3999));
        assert_eq!(kiki.speech().as_deref(), Some("Hallo"));
        clock.advance(Duration::from_millis(1));
        assert_eq!(kiki.speech(), None);
    }

    #[test]
    fn bubble_without_duration_stays() {
        let clock = SharedClock::new();
        let kiki = Kiki::new(clock.clone());
        kiki.speak("Bleibe", SpeakOptions::default());
        clock.advance(Duration::from_secs(3600));
        assert_eq!(kiki.speech().as_deref(), Some("Bleibe"));
        kiki.hide_speech();
        assert_eq!(kiki.speech(), None);
    }

    #[test]
    fn expiry_is_reported_once_per_bubble() {
        let clock = SharedClock::new();
        let kiki = Kiki::new(clock.clone());
        assert_eq!(kiki.take_expiry(), None);

        kiki.speak("Bleibe", SpeakOptions::default());
        assert_eq!(kiki.take_expiry(), None);

        kiki.react_to_answer(false);
        clock.advance(Duration::from_millis(1000));
        assert_eq!(kiki.take_expiry(), Some(Duration::from_millis(3000)));
        assert_eq!(kiki.take_expiry(), None);

        kiki.react_to_answer(true);
        assert_eq!(kiki.take_expiry(), Some(CORRECT_SPEECH));
    }

    #[test]
    fn answer_messages_rotate() {
        let kiki = Kiki::new(SharedClock::new());
        let mut seen = Vec::new();
        for _ in 0..5 {
            kiki.react_to_answer(true);
            seen.push(kiki.speech().unwrap_or_default());
        }
        assert_eq!(
            seen,
            vec!["Super gemacht!", "Toll!", "Richtig!", "Genau!", "Super gemacht!"]
        );
        assert_eq!(kiki.emotion(), Emotion::Proud);
        kiki.react_to_answer(false);
        assert_eq!(kiki.emotion(), Emotion::Thoughtful);
        assert_eq!(
            kiki.speech().as_deref(),
            Some("Kein Problem, versuch es nochmal!")
        );
    }

    #[test]
    fn quiz_end_reactions() {
        let kiki = Kiki::new(SharedClock::new());
        kiki.react_to_quiz_end(4, 5);
        assert_eq!(kiki.emotion(), Emotion::Proud);
        assert_eq!(
            kiki.speech().as_deref(),
            Some("Super! Du hast 4 von 5 richtig!")
        );
        kiki.react_to_quiz_end(2, 5);
        assert_eq!(kiki.emotion(), Emotion::Thoughtful);
        assert_eq!(
            kiki.speech().as_deref(),
            Some("Das war schon gut! Versuch die Lektion nochmal!")
        );
    }
}
