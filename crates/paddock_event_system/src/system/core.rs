/// Core EventSystem implementation
use crate::events::{EventHandler, EventKind};
use super::stats::{EventSystemStats, StatsCounters};
use dashmap::DashMap;
use std::sync::Arc;

/// The event bus fanning server-originated events out to registered handlers.
///
/// Handlers are stored per [`EventKind`] in registration order. Lists are
/// populated while plugins register at startup and only read afterwards, so
/// the lock-free `DashMap` read path is what every dispatch takes.
pub struct EventSystem {
    /// Handler lists keyed by event kind
    pub(super) handlers: DashMap<EventKind, Vec<Arc<dyn EventHandler>>>,
    /// System statistics for monitoring
    pub(super) stats: StatsCounters,
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("handlers", &"[handlers]")
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl EventSystem {
    /// Creates a new event system with no registered handlers.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            stats: StatsCounters::default(),
        }
    }

    /// Gets the current event system statistics
    #[inline]
    pub fn get_stats(&self) -> EventSystemStats {
        self.stats.snapshot()
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map(|entry| entry.len()).unwrap_or(0)
    }

    /// Names of the handlers registered for `kind`, in registration order.
    pub fn handler_names(&self, kind: EventKind) -> Vec<String> {
        self.handlers
            .get(&kind)
            .map(|entry| {
                entry
                    .iter()
                    .map(|handler| handler.handler_name().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}
