#![forbid(unsafe_code)]

//! Transport abstraction for content documents.
//!
//! A [`Fetch`] resolves a path to a status code and a body. The browser build
//! binds this to `window.fetch`; native builds and tests use [`MemoryFetch`]
//! or [`DirFetch`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};

/// Raw transport response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP-like status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

impl FetchResponse {
    /// A `200` response with the given body.
    #[must_use]
    pub fn ok_with(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// A bodiless response with the given status.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    /// Whether the status is in the success range.
    #[must_use]
    pub const fn ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level failure (no response at all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    path: String,
    message: String,
}

impl FetchError {
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Requested path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch {} failed: {}", self.path, self.message)
    }
}

impl std::error::Error for FetchError {}

/// Asynchronous document source.
pub trait Fetch {
    /// Request the document at `path`.
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, Result<FetchResponse, FetchError>>;
}

impl<T: Fetch + ?Sized> Fetch for Rc<T> {
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, Result<FetchResponse, FetchError>> {
        (**self).fetch(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

/// Path-keyed canned responses. Unknown paths answer `404`.
#[derive(Debug, Default)]
pub struct MemoryFetch {
    routes: RefCell<HashMap<String, Result<FetchResponse, String>>>,
    hits: RefCell<HashMap<String, usize>>,
}

impl MemoryFetch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `path`.
    pub fn insert(&self, path: impl Into<String>, body: impl Into<String>) {
        self.routes
            .borrow_mut()
            .insert(path.into(), Ok(FetchResponse::ok_with(body)));
    }

    /// Serve a bodiless response with `status` at `path`.
    pub fn insert_status(&self, path: impl Into<String>, status: u16) {
        self.routes
            .borrow_mut()
            .insert(path.into(), Ok(FetchResponse::status(status)));
    }

    /// Make requests for `path` fail at the transport level.
    pub fn insert_failure(&self, path: impl Into<String>, message: impl Into<String>) {
        self.routes
            .borrow_mut()
            .insert(path.into(), Err(message.into()));
    }

    /// Forget whatever is served at `path`.
    pub fn remove(&self, path: &str) {
        self.routes.borrow_mut().remove(path);
    }

    /// How many times `path` was requested.
    #[must_use]
    pub fn requests(&self, path: &str) -> usize {
        self.hits.borrow().get(path).copied().unwrap_or(0)
    }
}

impl Fetch for MemoryFetch {
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, Result<FetchResponse, FetchError>> {
        *self.hits.borrow_mut().entry(path.to_owned()).or_insert(0) += 1;
        let result = match self.routes.borrow().get(path) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(message)) => Err(FetchError::new(path, message.clone())),
            None => Ok(FetchResponse::status(404)),
        };
        future::ready(result).boxed_local()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory
// ─────────────────────────────────────────────────────────────────────────────

/// Serves files below a root directory. Missing files answer `404`.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct DirFetch {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl DirFetch {
    #[must_use]
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> std::path::PathBuf {
        let relative = path.trim_start_matches("./").trim_start_matches('/');
        self.root.join(relative)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Fetch for DirFetch {
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, Result<FetchResponse, FetchError>> {
        let file = self.resolve(path);
        let result = match std::fs::read_to_string(&file) {
            Ok(body) => Ok(FetchResponse::ok_with(body)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(FetchResponse::status(404))
            }
            Err(err) => Err(FetchError::new(path, err.to_string())),
        };
        future::ready(result).boxed_local()
    }
}
