#![forbid(unsafe_code)]

use serde::Serialize;

use super::Link;
use crate::catalog::{MINI_APPS, MiniApp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppCard {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub href: String,
}

impl From<&MiniApp> for AppCard {
    fn from(app: &MiniApp) -> Self {
        Self {
            id: app.id.to_owned(),
            name: app.name.to_owned(),
            emoji: app.emoji.to_owned(),
            href: format!("/apps/{}", app.id),
        }
    }
}

/// Cards for every mini-app.
#[must_use]
pub fn app_cards() -> Vec<AppCard> {
    MINI_APPS.iter().map(AppCard::from).collect()
}

/// The mini-app hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppsView {
    pub title: String,
    pub subtitle: String,
    pub apps: Vec<AppCard>,
    pub back: Link,
}

impl Default for AppsView {
    fn default() -> Self {
        Self {
            title: "Mini-Apps".to_owned(),
            subtitle: "Probier KI selbst aus!".to_owned(),
            apps: app_cards(),
            back: Link::new("/", "Zurueck zur Uebersicht"),
        }
    }
}

/// Shell around one mini-app; the host mounts the generator inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiniAppView {
    pub app: AppCard,
    pub back: Link,
}

impl MiniAppView {
    #[must_use]
    pub fn new(app: &MiniApp) -> Self {
        Self {
            app: AppCard::from(app),
            back: Link::new("/apps", "← Alle Apps"),
        }
    }
}
