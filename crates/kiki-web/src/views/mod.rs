#![forbid(unsafe_code)]

//! Page models.
//!
//! Every page is plain serialisable data. The host turns a [`Page`] into
//! markup; paths in links carry no leading `#`.

pub mod apps;
pub mod home;
pub mod status;
pub mod teacher;

use kiki_walkers::{LessonPage, QuizPage};
use serde::Serialize;

use crate::kiki::MascotView;

pub use apps::{AppCard, AppsView, MiniAppView};
pub use home::{HomeView, LessonCard, SoundToggle};
pub use status::{CrashView, ErrorView, LoadingView, NotFoundView};
pub use teacher::{TeacherLesson, TeacherView};

/// A navigation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    pub label: String,
}

impl Link {
    #[must_use]
    pub fn new(href: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            label: label.into(),
        }
    }
}

/// What the mount element shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", content = "data", rename_all = "camelCase")]
pub enum Page {
    /// Nothing dispatched yet, or the dispatcher is inert.
    Blank,
    Home(HomeView),
    Loading(LoadingView),
    Lesson(LessonPage),
    Quiz(QuizPage),
    Error(ErrorView),
    Apps(AppsView),
    MiniApp(MiniAppView),
    Teacher(TeacherView),
    NotFound(NotFoundView),
    Crashed(CrashView),
}

impl Page {
    /// Short name, for logs and assertions.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Page::Blank => "blank",
            Page::Home(_) => "home",
            Page::Loading(_) => "loading",
            Page::Lesson(_) => "lesson",
            Page::Quiz(_) => "quiz",
            Page::Error(_) => "error",
            Page::Apps(_) => "apps",
            Page::MiniApp(_) => "miniApp",
            Page::Teacher(_) => "teacher",
            Page::NotFound(_) => "notFound",
            Page::Crashed(_) => "crashed",
        }
    }
}

/// One rendered frame: the page plus the mascot overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppView {
    pub path: String,
    pub page: Page,
    pub mascot: Option<MascotView>,
}
