#![forbid(unsafe_code)]

//! Memoising document loaders.
//!
//! A [`ContentLoader`] turns an id into a validated, typed descriptor:
//!
//! 1. cache hit → return the shared descriptor without touching the transport
//! 2. fetch `template` with `{id}` substituted
//! 3. non-success status → [`ContentError::Status`]
//! 4. decode JSON, run structural validation, decode typed
//! 5. cache and return
//!
//! Failures at any step are logged and returned but never cached, so a later
//! call re-fetches.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, error};

use crate::cache::ContentCache;
use crate::descriptor::{ContentKind, Descriptor, LessonDescriptor, QuizDescriptor};
use crate::fetch::{Fetch, FetchError};
use crate::validate::ValidationError;

/// Why a document could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// The transport failed before any response.
    Fetch(FetchError),
    /// The transport answered with a non-success status.
    Status {
        kind: ContentKind,
        id: u32,
        status: u16,
    },
    /// The body was not valid JSON or did not match the typed shape.
    Parse {
        kind: ContentKind,
        id: u32,
        message: String,
    },
    /// The document failed structural validation.
    Invalid(ValidationError),
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "{err}"),
            Self::Status { kind, id, .. } => write!(f, "{} {id} nicht gefunden", kind.label()),
            Self::Parse { kind, id, message } => {
                write!(f, "{} {id} ist kein gültiges JSON: {message}", kind.label())
            }
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ContentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ContentError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

impl From<FetchError> for ContentError {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err)
    }
}

/// Result type for content operations.
pub type ContentResult<T> = Result<T, ContentError>;

/// Substitute `{id}` in a path template.
#[must_use]
pub fn expand_template(template: &str, id: u32) -> String {
    template.replace("{id}", &id.to_string())
}

/// Cached loader for one descriptor type.
pub struct ContentLoader<D, F = Rc<dyn Fetch>> {
    fetch: F,
    template: String,
    cache: RefCell<ContentCache<u32, Rc<D>>>,
    _kind: PhantomData<fn() -> D>,
}

/// Loader for lesson descriptors.
pub type LessonLoader<F = Rc<dyn Fetch>> = ContentLoader<LessonDescriptor, F>;
/// Loader for quiz descriptors.
pub type QuizLoader<F = Rc<dyn Fetch>> = ContentLoader<QuizDescriptor, F>;

impl<D, F> fmt::Debug for ContentLoader<D, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentLoader")
            .field("template", &self.template)
            .field("cached", &self.cache.borrow().len())
            .finish()
    }
}

impl<D: Descriptor, F: Fetch> ContentLoader<D, F> {
    /// Loader using the conventional path for `D`.
    #[must_use]
    pub fn new(fetch: F) -> Self {
        Self::with_template(fetch, D::KIND.default_template())
    }

    /// Loader using a custom path template (`{id}` is substituted).
    #[must_use]
    pub fn with_template(fetch: F, template: impl Into<String>) -> Self {
        Self {
            fetch,
            template: template.into(),
            cache: RefCell::new(ContentCache::new()),
            _kind: PhantomData,
        }
    }

    /// Path template in use.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Path requested for `id`.
    #[must_use]
    pub fn path_for(&self, id: u32) -> String {
        expand_template(&self.template, id)
    }

    /// Load, validate and cache the descriptor for `id`.
    pub async fn load(&self, id: u32) -> ContentResult<Rc<D>> {
        if let Some(hit) = self.cache.borrow().get(&id) {
            debug!(kind = D::KIND.label(), id, "content cache hit");
            return Ok(hit);
        }

        match self.fetch_and_decode(id).await {
            Ok(descriptor) => {
                let descriptor = Rc::new(descriptor);
                self.cache.borrow_mut().insert(id, Rc::clone(&descriptor));
                Ok(descriptor)
            }
            Err(err) => {
                error!(kind = D::KIND.label(), id, error = %err, "content load failed");
                Err(err)
            }
        }
    }

    async fn fetch_and_decode(&self, id: u32) -> ContentResult<D> {
        let path = self.path_for(id);
        let response = self.fetch.fetch(&path).await?;
        if !response.ok() {
            return Err(ContentError::Status {
                kind: D::KIND,
                id,
                status: response.status,
            });
        }

        let parse_error = |err: serde_json::Error| ContentError::Parse {
            kind: D::KIND,
            id,
            message: err.to_string(),
        };
        let raw: Value = serde_json::from_str(&response.body).map_err(parse_error)?;
        D::validate(&raw)?;
        serde_json::from_value(raw).map_err(parse_error)
    }

    /// Load every id in turn, ignoring individual failures.
    ///
    /// Returns how many ids ended up cached.
    pub async fn preload(&self, ids: impl IntoIterator<Item = u32>) -> usize {
        let mut loaded = 0;
        for id in ids {
            if self.load(id).await.is_ok() {
                loaded += 1;
            }
        }
        loaded
    }

    /// Whether `id` is already cached.
    #[must_use]
    pub fn is_cached(&self, id: u32) -> bool {
        self.cache.borrow().has(&id)
    }

    /// Number of cached descriptors.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Drop every cached descriptor.
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }
}
