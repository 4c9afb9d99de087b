#![forbid(unsafe_code)]

//! Mascot capability interface.
//!
//! Walkers and views never own the mascot. They receive an optional shared
//! handle and call through it; a missing handle turns every call into a no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

/// Affect shown by the mascot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Thoughtful,
    Proud,
    Sad,
    Surprised,
    Curious,
}

impl Emotion {
    /// Every emotion, in declaration order.
    pub const ALL: [Emotion; 6] = [
        Emotion::Happy,
        Emotion::Thoughtful,
        Emotion::Proud,
        Emotion::Sad,
        Emotion::Surprised,
        Emotion::Curious,
    ];

    /// Tag used in content documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Thoughtful => "thoughtful",
            Emotion::Proud => "proud",
            Emotion::Sad => "sad",
            Emotion::Surprised => "surprised",
            Emotion::Curious => "curious",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tag that names no known emotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEmotion(pub String);

impl fmt::Display for UnknownEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown emotion tag {:?}", self.0)
    }
}

impl std::error::Error for UnknownEmotion {}

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| UnknownEmotion(s.to_owned()))
    }
}

/// Options for [`Mascot::speak`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpeakOptions {
    /// How long the bubble stays up; `None` keeps it until replaced.
    pub duration: Option<Duration>,
}

impl SpeakOptions {
    #[must_use]
    pub const fn for_duration(duration: Duration) -> Self {
        Self {
            duration: Some(duration),
        }
    }
}

/// The mascot collaborator.
pub trait Mascot {
    fn set_emotion(&self, emotion: Emotion);
    fn speak(&self, text: &str, options: SpeakOptions);
    fn react_to_answer(&self, is_correct: bool);
    fn react_to_quiz_end(&self, score: u32, total: u32);
}

/// Optional shared mascot reference.
pub type MascotHandle = Option<Rc<dyn Mascot>>;

/// Set the emotion named by `tag`. Unknown tags are logged and ignored.
pub fn set_emotion_tag(mascot: &MascotHandle, tag: &str) {
    let Some(mascot) = mascot else { return };
    match tag.parse::<Emotion>() {
        Ok(emotion) => mascot.set_emotion(emotion),
        Err(_err) => {
            kiki_core::warn!(tag, "ignoring invalid mascot emotion");
        }
    }
}

/// Say `text` if a mascot is present.
pub fn speak(mascot: &MascotHandle, text: &str, options: SpeakOptions) {
    if let Some(mascot) = mascot {
        mascot.speak(text, options);
    }
}

/// Set `emotion` if a mascot is present.
pub fn set_emotion(mascot: &MascotHandle, emotion: Emotion) {
    if let Some(mascot) = mascot {
        mascot.set_emotion(emotion);
    }
}

/// One call received by a [`RecordingMascot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MascotCall {
    Emotion(Emotion),
    Speak {
        text: String,
        duration: Option<Duration>,
    },
    Answer(bool),
    QuizEnd {
        score: u32,
        total: u32,
    },
}

/// A mascot that records every call. Used by tests and headless hosts.
#[derive(Debug, Default)]
pub struct RecordingMascot {
    calls: RefCell<Vec<MascotCall>>,
}

impl RecordingMascot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<MascotCall> {
        self.calls.borrow().clone()
    }

    /// Remove and return the calls received so far.
    pub fn take(&self) -> Vec<MascotCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Texts passed to `speak`, in order.
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                MascotCall::Speak { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Mascot for RecordingMascot {
    fn set_emotion(&self, emotion: Emotion) {
        self.calls.borrow_mut().push(MascotCall::Emotion(emotion));
    }

    fn speak(&self, text: &str, options: SpeakOptions) {
        self.calls.borrow_mut().push(MascotCall::Speak {
            text: text.to_owned(),
            duration: options.duration,
        });
    }

    fn react_to_answer(&self, is_correct: bool) {
        self.calls.borrow_mut().push(MascotCall::Answer(is_correct));
    }

    fn react_to_quiz_end(&self, score: u32, total: u32) {
        self.calls
            .borrow_mut()
            .push(MascotCall::QuizEnd { score, total });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse() {
        for e in Emotion::ALL {
            assert_eq!(e.as_str().parse::<Emotion>(), Ok(e));
        }
        assert_eq!(
            "excited".parse::<Emotion>(),
            Err(UnknownEmotion("excited".into()))
        );
    }

    #[test]
    fn invalid_tag_is_ignored() {
        let rec = Rc::new(RecordingMascot::new());
        let handle: MascotHandle = Some(rec.clone());
        set_emotion_tag(&handle, "excited");
        set_emotion_tag(&handle, "proud");
        assert_eq!(rec.calls(), vec![MascotCall::Emotion(Emotion::Proud)]);
    }

    #[test]
    fn absent_mascot_is_noop() {
        let handle: MascotHandle = None;
        set_emotion_tag(&handle, "happy");
        speak(&handle, "hallo", SpeakOptions::default());
        set_emotion(&handle, Emotion::Sad);
    }

    #[test]
    fn take_drains() {
        let rec = RecordingMascot::new();
        rec.react_to_answer(true);
        assert_eq!(rec.take(), vec![MascotCall::Answer(true)]);
        assert!(rec.calls().is_empty());
    }
}
