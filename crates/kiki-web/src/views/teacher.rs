#![forbid(unsafe_code)]

use serde::Serialize;

use super::Link;
use super::apps::{AppCard, app_cards};
use crate::catalog::LessonEntry;

const TIPS: [&str; 5] = [
    "Beginne mit Lektion 1 als Einfuehrung (ca. 10-15 Min)",
    "Lasse Schueler die Quizze einzeln oder in Gruppen loesen",
    "Die Mini-Apps eignen sich gut fuer praktische Uebungen",
    "Kiki reagiert auf richtige/falsche Antworten - das motiviert!",
    "Der Ton kann oben rechts auf der Startseite deaktiviert werden",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherLesson {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub lesson: Link,
    pub quiz: Link,
}

/// Teacher overview: every lesson and quiz without progress gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherView {
    pub badge: String,
    pub title: String,
    pub subtitle: String,
    pub lessons: Vec<TeacherLesson>,
    pub apps: Vec<AppCard>,
    pub tips: Vec<String>,
    pub reset_label: String,
    /// Question the host asks before dispatching the reset action.
    pub reset_confirm: String,
    pub back: Link,
}

impl TeacherView {
    #[must_use]
    pub fn build(lessons: &[LessonEntry]) -> Self {
        let lessons = lessons
            .iter()
            .map(|l| TeacherLesson {
                id: l.id,
                title: l.title.clone(),
                description: l.description.clone(),
                lesson: Link::new(format!("/lesson/{}", l.id), "Lektion starten"),
                quiz: Link::new(format!("/quiz/{}", l.id), "Quiz zeigen"),
            })
            .collect();
        Self {
            badge: "Lehrer-Modus".to_owned(),
            title: "Unterrichtsuebersicht".to_owned(),
            subtitle: "Alle Lektionen und Quizze auf einen Blick. Navigation ohne Fortschrittsbeschraenkungen."
                .to_owned(),
            lessons,
            apps: app_cards(),
            tips: TIPS.iter().map(|t| (*t).to_owned()).collect(),
            reset_label: "Fortschritt zuruecksetzen".to_owned(),
            reset_confirm: "Wirklich den gesamten Fortschritt zuruecksetzen?".to_owned(),
            back: Link::new("/", "← Zurueck"),
        }
    }
}
