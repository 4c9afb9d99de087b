#![forbid(unsafe_code)]

//! Static catalogue: the lessons and the mini-apps.

use serde::{Deserialize, Serialize};

/// One lesson as listed on the home and teacher pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonEntry {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl LessonEntry {
    #[must_use]
    pub fn new(id: u32, title: &str, description: &str) -> Self {
        Self {
            id,
            title: title.to_owned(),
            description: description.to_owned(),
        }
    }
}

/// The seven lessons of the course.
#[must_use]
pub fn default_lessons() -> Vec<LessonEntry> {
    vec![
        LessonEntry::new(1, "Was ist KI?", "Einfuehrung in kuenstliche Intelligenz"),
        LessonEntry::new(2, "KI-Arten erklärt", "Text-KI, Bild-KI, Sprach-KI"),
        LessonEntry::new(3, "Was kann KI heute?", "Aktuelle Faehigkeiten von KI"),
        LessonEntry::new(4, "KI im Alltag", "KI auf Handy, beim Streamen, zu Hause"),
        LessonEntry::new(5, "Mit KI sprechen", "Prompting-Techniken fuer Kinder"),
        LessonEntry::new(6, "Übungen", "Praktische Uebungen zum Prompting"),
        LessonEntry::new(7, "Erste App bauen", "Einfuehrung in die Mini-Apps"),
    ]
}

/// A mini-app. Its generator lives with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MiniApp {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
}

pub const MINI_APPS: [MiniApp; 4] = [
    MiniApp {
        id: "story",
        name: "Geschichten-Generator",
        emoji: "📖",
    },
    MiniApp {
        id: "animal",
        name: "Tier-Quiz",
        emoji: "🐾",
    },
    MiniApp {
        id: "joke",
        name: "Witz-Maschine",
        emoji: "😂",
    },
    MiniApp {
        id: "name",
        name: "Namens-Bedeutung",
        emoji: "✨",
    },
];

/// Look up a mini-app by route id.
#[must_use]
pub fn mini_app(id: &str) -> Option<&'static MiniApp> {
    MINI_APPS.iter().find(|app| app.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lessons_are_numbered_in_order() {
        let ids: Vec<u32> = default_lessons().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn mini_app_lookup() {
        assert_eq!(mini_app("joke").map(|a| a.name), Some("Witz-Maschine"));
        assert!(mini_app("chess").is_none());
    }
}
