#![forbid(unsafe_code)]

//! Host listener bookkeeping.
//!
//! Views that need global input (the lesson walker's arrow keys) attach a
//! listener here and must detach it on teardown. The registry makes leaks
//! observable: after any number of navigations the keyboard count stays at
//! most one.

use std::cell::RefCell;
use std::rc::Rc;

/// Kind of host input a listener consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Keyboard,
    Touch,
}

/// Handle returned by [`ListenerRegistry::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of attached listeners.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: u64,
    active: Vec<(ListenerId, ListenerKind)>,
}

/// Shared handle used by walkers and the app.
pub type SharedListeners = Rc<RefCell<ListenerRegistry>>;

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared registry.
    #[must_use]
    pub fn shared() -> SharedListeners {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Attach a listener of `kind`.
    pub fn attach(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.active.push((id, kind));
        tracing::trace!(?kind, id = id.0, "listener attached");
        id
    }

    /// Detach `id`. Returns `false` if it was not attached.
    pub fn detach(&mut self, id: ListenerId) -> bool {
        let before = self.active.len();
        self.active.retain(|(active, _)| *active != id);
        let removed = self.active.len() != before;
        if removed {
            tracing::trace!(id = id.0, "listener detached");
        }
        removed
    }

    #[must_use]
    pub fn is_attached(&self, id: ListenerId) -> bool {
        self.active.iter().any(|(active, _)| *active == id)
    }

    /// Number of attached listeners of `kind`.
    #[must_use]
    pub fn count(&self, kind: ListenerKind) -> usize {
        self.active.iter().filter(|(_, k)| *k == kind).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_detach() {
        let mut reg = ListenerRegistry::new();
        let a = reg.attach(ListenerKind::Keyboard);
        let b = reg.attach(ListenerKind::Touch);
        assert_ne!(a, b);
        assert_eq!(reg.count(ListenerKind::Keyboard), 1);
        assert!(reg.detach(a));
        assert!(!reg.detach(a));
        assert!(!reg.is_attached(a));
        assert!(reg.is_attached(b));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut reg = ListenerRegistry::new();
        let a = reg.attach(ListenerKind::Keyboard);
        reg.detach(a);
        let b = reg.attach(ListenerKind::Keyboard);
        assert_ne!(a, b);
        assert!(!reg.is_attached(a));
    }
}
