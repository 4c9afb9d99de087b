#![forbid(unsafe_code)]

//! Lesson and quiz content: typed descriptors, structural validation, a
//! transport abstraction and memoising loaders with an explicit cache.

pub mod cache;
pub mod descriptor;
pub mod fetch;
pub mod loader;
pub mod validate;

pub use cache::ContentCache;
pub use descriptor::{
    ContentKind, Descriptor, ExampleCard, Feedback, LessonDescriptor, Question, QuizDescriptor,
    Screen, ScreenContent, ScreenKind,
};
#[cfg(not(target_arch = "wasm32"))]
pub use fetch::DirFetch;
pub use fetch::{Fetch, FetchError, FetchResponse, MemoryFetch};
pub use loader::{ContentError, ContentLoader, ContentResult, LessonLoader, QuizLoader};
pub use validate::ValidationError;
