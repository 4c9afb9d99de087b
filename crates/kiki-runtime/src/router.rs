#![forbid(unsafe_code)]

//! Fragment-path route dispatcher.
//!
//! Patterns are `/`-delimited sequences of literal segments and `:name`
//! variables, compiled once at registration. Resolution order:
//!
//! 1. exact match against patterns without variables
//! 2. parameterised patterns in registration order, first full match wins
//! 3. the not-found handler with empty params
//! 4. [`Resolution::Unmatched`] when no not-found handler is registered
//!
//! The router is generic over the handler type; the app uses plain `fn`
//! pointers so handlers are `Copy`.

use std::fmt;

/// Conventional path of the not-found route.
pub const NOT_FOUND_PATH: &str = "/404";

/// Derive the route path from a raw URL fragment.
///
/// Strips one leading `#`; an empty result means `/`.
#[must_use]
pub fn current_path(fragment: &str) -> String {
    let path = fragment.strip_prefix('#').unwrap_or(fragment);
    if path.is_empty() {
        "/".to_owned()
    } else {
        path.to_owned()
    }
}

/// One compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment.
    Literal(String),
    /// Binds any path segment under this name.
    Variable(String),
}

/// A pattern compiled into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile `pattern`.
    #[must_use]
    pub fn compile(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .map(|seg| match seg.strip_prefix(':') {
                Some(name) => Segment::Variable(name.to_owned()),
                None => Segment::Literal(seg.to_owned()),
            })
            .collect();
        Self {
            source: pattern.to_owned(),
            segments,
        }
    }

    /// Pattern as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether any segment is a variable.
    #[must_use]
    pub fn has_params(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Variable(_)))
    }

    /// Bind `path` against this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = Params::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Variable(name) => params.insert(name.clone(), part.to_owned()),
            }
        }
        Some(params)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Named values bound from a path, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// Bind `name`; a repeated name keeps the later value.
    pub fn insert(&mut self, name: String, value: String) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Params {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut params = Self::default();
        for (name, value) in pairs {
            params.insert(name.to_owned(), value.to_owned());
        }
        params
    }
}

/// Bind `path` against `pattern` without registering anything.
#[must_use]
pub fn extract_params(pattern: &str, path: &str) -> Option<Params> {
    RoutePattern::compile(pattern).matches(path)
}

/// Outcome of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<H> {
    /// A registered route (or the not-found route) applies.
    Matched {
        handler: H,
        params: Params,
        /// Source of the pattern that matched.
        pattern: String,
    },
    /// Nothing applies and no not-found route exists.
    Unmatched,
}

impl<H> Resolution<H> {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Ordered route table.
#[derive(Debug, Clone)]
pub struct Router<H> {
    routes: Vec<(RoutePattern, H)>,
    not_found: Option<(RoutePattern, H)>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            not_found: None,
        }
    }
}

impl<H: Copy> Router<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a router from `(pattern, handler)` pairs in order.
    ///
    /// A pair registered under [`NOT_FOUND_PATH`] becomes the fallback.
    #[must_use]
    pub fn with_routes<'a>(routes: impl IntoIterator<Item = (&'a str, H)>) -> Self {
        let mut router = Self::new();
        for (pattern, handler) in routes {
            router.register(pattern, handler);
        }
        router
    }

    /// Register `handler` under `pattern`. Re-registering a pattern replaces
    /// its handler in place.
    pub fn register(&mut self, pattern: &str, handler: H) -> &mut Self {
        if pattern == NOT_FOUND_PATH {
            return self.not_found(handler);
        }
        let compiled = RoutePattern::compile(pattern);
        match self.routes.iter_mut().find(|(p, _)| *p == compiled) {
            Some(entry) => entry.1 = handler,
            None => self.routes.push((compiled, handler)),
        }
        self
    }

    /// Register the fallback handler.
    pub fn not_found(&mut self, handler: H) -> &mut Self {
        self.not_found = Some((RoutePattern::compile(NOT_FOUND_PATH), handler));
        self
    }

    /// Number of registered routes, excluding the fallback.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve `path` to a handler and its params.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Resolution<H> {
        let exact = self
            .routes
            .iter()
            .find(|(p, _)| !p.has_params() && p.as_str() == path);
        if let Some((pattern, handler)) = exact {
            tracing::debug!(path, pattern = pattern.as_str(), "route matched exactly");
            return Resolution::Matched {
                handler: *handler,
                params: Params::default(),
                pattern: pattern.as_str().to_owned(),
            };
        }

        for (pattern, handler) in self.routes.iter().filter(|(p, _)| p.has_params()) {
            if let Some(params) = pattern.matches(path) {
                tracing::debug!(path, pattern = pattern.as_str(), "route matched");
                return Resolution::Matched {
                    handler: *handler,
                    params,
                    pattern: pattern.as_str().to_owned(),
                };
            }
        }

        match &self.not_found {
            Some((pattern, handler)) => {
                tracing::debug!(path, "no route, using not-found");
                Resolution::Matched {
                    handler: *handler,
                    params: Params::default(),
                    pattern: pattern.as_str().to_owned(),
                }
            }
            None => {
                tracing::debug!(path, "no route and no not-found handler");
                Resolution::Unmatched
            }
        }
    }
}
