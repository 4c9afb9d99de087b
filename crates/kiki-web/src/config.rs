#![forbid(unsafe_code)]

//! Application configuration.
//!
//! Every field has a default, so a host may pass a partial JSON options
//! object (or none at all). Durations are given in milliseconds.

use std::time::Duration;

use kiki_content::ContentKind;
use kiki_runtime::state_persistence::StateStore;
use kiki_walkers::WalkerTiming;
use serde::{Deserialize, Serialize};

use crate::catalog::{self, LessonEntry};

/// Startup options for the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Storage key of the persisted state record.
    pub storage_key: String,
    /// Selector of the mount element; the dispatcher stays inert without it.
    pub mount_selector: String,
    /// Path template for lesson documents (`{id}` is replaced).
    pub lesson_path_template: String,
    /// Path template for quiz documents (`{id}` is replaced).
    pub quiz_path_template: String,
    /// Lessons shown on the home and teacher pages.
    pub lessons: Vec<LessonEntry>,
    /// Horizontal travel in pixels a swipe must exceed.
    pub swipe_threshold: f64,
    pub speech_delay_ms: u64,
    pub speech_duration_ms: u64,
    pub auto_advance_ms: u64,
    pub greeting_delay_ms: u64,
    pub reset_delay_ms: u64,
    pub error_speech_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_key: StateStore::DEFAULT_KEY.to_owned(),
            mount_selector: "#app".to_owned(),
            lesson_path_template: ContentKind::Lesson.default_template().to_owned(),
            quiz_path_template: ContentKind::Quiz.default_template().to_owned(),
            lessons: catalog::default_lessons(),
            swipe_threshold: kiki_core::gesture::DEFAULT_SWIPE_THRESHOLD,
            speech_delay_ms: 300,
            speech_duration_ms: 5000,
            auto_advance_ms: 2000,
            greeting_delay_ms: 500,
            reset_delay_ms: 1500,
            error_speech_ms: 4000,
        }
    }
}

impl AppConfig {
    /// Parse a JSON options object over the defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    #[must_use]
    pub fn with_lesson_path_template(mut self, template: impl Into<String>) -> Self {
        self.lesson_path_template = template.into();
        self
    }

    #[must_use]
    pub fn with_quiz_path_template(mut self, template: impl Into<String>) -> Self {
        self.quiz_path_template = template.into();
        self
    }

    #[must_use]
    pub fn with_lessons(mut self, lessons: Vec<LessonEntry>) -> Self {
        self.lessons = lessons;
        self
    }

    #[must_use]
    pub fn with_swipe_threshold(mut self, threshold: f64) -> Self {
        self.swipe_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_auto_advance(mut self, delay: Duration) -> Self {
        self.auto_advance_ms = millis(delay);
        self
    }

    #[must_use]
    pub fn with_greeting_delay(mut self, delay: Duration) -> Self {
        self.greeting_delay_ms = millis(delay);
        self
    }

    #[must_use]
    pub fn greeting_delay(&self) -> Duration {
        Duration::from_millis(self.greeting_delay_ms)
    }

    #[must_use]
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    #[must_use]
    pub fn error_speech(&self) -> Duration {
        Duration::from_millis(self.error_speech_ms)
    }

    /// Timings handed to the walkers.
    #[must_use]
    pub fn walker_timing(&self) -> WalkerTiming {
        WalkerTiming {
            speech_delay: Duration::from_millis(self.speech_delay_ms),
            speech_duration: Duration::from_millis(self.speech_duration_ms),
            auto_advance: Duration::from_millis(self.auto_advance_ms),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_app_timings() {
        let config = AppConfig::default();
        let timing = config.walker_timing();
        assert_eq!(timing.speech_delay, Duration::from_millis(300));
        assert_eq!(timing.speech_duration, Duration::from_millis(5000));
        assert_eq!(timing.auto_advance, Duration::from_millis(2000));
        assert_eq!(config.greeting_delay(), Duration::from_millis(500));
        assert_eq!(config.reset_delay(), Duration::from_millis(1500));
        assert_eq!(config.error_speech(), Duration::from_millis(4000));
        assert_eq!(config.storage_key, "ki-und-ich-state");
        assert_eq!(config.lessons.len(), 7);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            AppConfig::from_json(r#"{"storageKey": "probe", "autoAdvanceMs": 10}"#).unwrap();
        assert_eq!(config.storage_key, "probe");
        assert_eq!(config.auto_advance_ms, 10);
        assert_eq!(config.speech_delay_ms, 300);
        assert_eq!(
            config.lesson_path_template,
            "./src/data/lessons/lesson-{id}.json"
        );
    }

    #[test]
    fn builders() {
        let config = AppConfig::default()
            .with_auto_advance(Duration::from_millis(50))
            .with_storage_key("k");
        assert_eq!(config.auto_advance_ms, 50);
        assert_eq!(config.storage_key, "k");
    }
}
