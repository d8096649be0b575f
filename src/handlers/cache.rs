//! Per-session handler resolution cache.

use super::HandlerRef;
use crate::event::EventKind;
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Host-side handler lookup, consulted for kinds with no explicit binding.
///
/// Returning `None` means "no handler"; the cache asks again on the next
/// dispatch of that kind.
pub trait HandlerSource {
    fn resolve(&mut self, kind: EventKind) -> Option<HandlerRef>;
}

/// A fixed table of handlers keyed by handler name (`"onjoin"`, ...).
///
/// Useful for hosts that assemble handlers by name. Names are normalized
/// with [`EventKind::from_handler_name`] on insert.
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<EventKind, HandlerRef>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler under `name`. Returns `false` if no event dispatches
    /// to that name.
    pub fn insert(&mut self, name: &str, handler: HandlerRef) -> bool {
        match EventKind::from_handler_name(name) {
            Some(kind) => {
                self.handlers.insert(kind, handler);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl HandlerSource for HandlerTable {
    fn resolve(&mut self, kind: EventKind) -> Option<HandlerRef> {
        self.handlers.get(&kind).cloned()
    }
}

/// Resolves event kinds to handlers and memoizes the hits.
///
/// Lookup order: memoized entry, explicit binding, host source. Misses are
/// never memoized, so a handler that appears later is picked up on the
/// next dispatch. Rebinding a kind replaces its memoized entry.
#[derive(Default)]
pub struct HandlerCache {
    bound: HashMap<EventKind, HandlerRef>,
    source: Option<Box<dyn HandlerSource>>,
    resolved: HashMap<EventKind, HandlerRef>,
}

impl HandlerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the handler for `kind`.
    pub fn resolve(&mut self, kind: EventKind) -> Option<HandlerRef> {
        if let Some(handler) = self.resolved.get(&kind) {
            trace!(handler = kind.handler_name(), "Handler cache hit");
            return Some(handler.clone());
        }

        let handler = match self.bound.get(&kind) {
            Some(handler) => Some(handler.clone()),
            None => self.source.as_mut().and_then(|source| source.resolve(kind)),
        };

        match handler {
            Some(handler) => {
                trace!(handler = kind.handler_name(), "Handler resolved");
                self.resolved.insert(kind, handler.clone());
                Some(handler)
            }
            None => {
                trace!(handler = kind.handler_name(), "No handler bound");
                None
            }
        }
    }

    /// Bind `handler` to `kind`, replacing any earlier binding.
    pub fn bind(&mut self, kind: EventKind, handler: HandlerRef) -> Option<HandlerRef> {
        self.resolved.remove(&kind);
        self.bound.insert(kind, handler)
    }

    /// Remove the explicit binding for `kind`. A host source may still
    /// supply a handler afterwards.
    pub fn unbind(&mut self, kind: EventKind) -> Option<HandlerRef> {
        self.resolved.remove(&kind);
        self.bound.remove(&kind)
    }

    /// Forget the memoized entry for `kind`.
    pub fn invalidate(&mut self, kind: EventKind) {
        self.resolved.remove(&kind);
    }

    /// Install the host source. Memoized entries are dropped.
    pub fn set_source(&mut self, source: Box<dyn HandlerSource>) {
        self.resolved.clear();
        self.source = Some(source);
    }

    pub fn is_cached(&self, kind: EventKind) -> bool {
        self.resolved.contains_key(&kind)
    }

    pub fn is_bound(&self, kind: EventKind) -> bool {
        self.bound.contains_key(&kind)
    }

    /// Release every handler and the host source.
    pub fn clear(&mut self) {
        self.resolved.clear();
        self.bound.clear();
        self.source = None;
    }
}

impl fmt::Debug for HandlerCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCache")
            .field("bound", &self.bound.keys().collect::<Vec<_>>())
            .field("resolved", &self.resolved.keys().collect::<Vec<_>>())
            .field("has_source", &self.source.is_some())
            .finish()
    }
}
