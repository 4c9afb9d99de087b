#![forbid(unsafe_code)]

use kiki_runtime::state_persistence::StateStore;
use serde::Serialize;

use super::Link;
use crate::catalog::LessonEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCard {
    pub id: u32,
    pub title: String,
    pub href: String,
    pub completed: bool,
    pub aria_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoundToggle {
    pub enabled: bool,
    pub icon: String,
    pub title: String,
}

impl SoundToggle {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        let (icon, title) = if enabled {
            ("🔊", "Ton deaktivieren")
        } else {
            ("🔇", "Ton aktivieren")
        };
        Self {
            enabled,
            icon: icon.to_owned(),
            title: title.to_owned(),
        }
    }
}

/// The landing page: lesson grid, sound toggle, links to apps and teacher mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub title: String,
    pub welcome: String,
    pub lessons: Vec<LessonCard>,
    pub sound: SoundToggle,
    pub apps_link: Link,
    pub teacher_link: Link,
}

impl HomeView {
    #[must_use]
    pub fn build(lessons: &[LessonEntry], store: &StateStore) -> Self {
        let completed = store.completed_lessons();
        let lessons = lessons
            .iter()
            .map(|lesson| {
                let done = completed.contains(&lesson.id);
                let suffix = if done { " (abgeschlossen)" } else { "" };
                LessonCard {
                    id: lesson.id,
                    title: lesson.title.clone(),
                    href: format!("/lesson/{}", lesson.id),
                    completed: done,
                    aria_label: format!("Lektion {}: {}{suffix}", lesson.id, lesson.title),
                }
            })
            .collect();
        Self {
            title: "KI und ich".to_owned(),
            welcome: "Willkommen! Lerne spielerisch, was Kuenstliche Intelligenz ist.".to_owned(),
            lessons,
            sound: SoundToggle::new(store.sound_enabled()),
            apps_link: Link::new("/apps", "🎮 Mini-Apps ausprobieren"),
            teacher_link: Link::new("/teacher", "👩‍🏫 Lehrer-Modus"),
        }
    }
}
