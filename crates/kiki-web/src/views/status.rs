#![forbid(unsafe_code)]

//! Transitional and failure pages.

use kiki_content::ContentKind;
use serde::Serialize;

use super::Link;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadingView {
    pub message: String,
}

impl LoadingView {
    #[must_use]
    pub fn new(kind: ContentKind) -> Self {
        Self {
            message: format!("{} wird geladen...", kind.label()),
        }
    }
}

/// A lesson or quiz that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub heading: String,
    pub detail: String,
    /// The underlying error message.
    pub message: String,
    pub back: Link,
}

impl ErrorView {
    /// Error page for `kind` number `id`. `id` is the raw route segment.
    #[must_use]
    pub fn content(kind: ContentKind, id: &str, message: String) -> Self {
        let label = kind.label();
        let back = match kind {
            ContentKind::Lesson => Link::new("/", "Zurück zur Übersicht"),
            ContentKind::Quiz => Link::new(format!("/lesson/{id}"), "Zurück zur Lektion"),
        };
        Self {
            heading: format!("{label} nicht verfügbar"),
            detail: format!("{label} {id} konnte nicht geladen werden."),
            message,
            back,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotFoundView {
    pub heading: String,
    pub message: Option<String>,
    pub back: Link,
}

impl NotFoundView {
    /// The generic 404 page.
    #[must_use]
    pub fn page() -> Self {
        Self {
            heading: "404".to_owned(),
            message: Some("Diese Seite wurde nicht gefunden.".to_owned()),
            back: Link::new("/", "Zur Startseite"),
        }
    }

    /// An unknown mini-app id.
    #[must_use]
    pub fn app() -> Self {
        Self {
            heading: "App nicht gefunden".to_owned(),
            message: None,
            back: Link::new("/apps", "Zurueck zu den Apps"),
        }
    }
}

/// The reload prompt shown after an unexpected failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrashView {
    pub heading: String,
    pub message: String,
}

impl Default for CrashView {
    fn default() -> Self {
        Self {
            heading: "Ein Fehler ist aufgetreten.".to_owned(),
            message: "Bitte lade die Seite neu.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_error_links_back_to_lesson() {
        let view = ErrorView::content(ContentKind::Quiz, "3", "Quiz 3 nicht gefunden".into());
        assert_eq!(view.heading, "Quiz nicht verfügbar");
        assert_eq!(view.back.href, "/lesson/3");
        let view = ErrorView::content(ContentKind::Lesson, "9", String::new());
        assert_eq!(view.detail, "Lektion 9 konnte nicht geladen werden.");
        assert_eq!(view.back.href, "/");
    }

    #[test]
    fn loading_message() {
        assert_eq!(LoadingView::new(ContentKind::Quiz).message, "Quiz wird geladen...");
    }
}
