/// Statistics tracking for the event system
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of event system statistics for monitoring
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSystemStats {
    /// Total number of registered event handlers
    pub total_handlers: u64,
    /// Total number of events dispatched since system start
    pub events_dispatched: u64,
    /// Total number of handler invocations that failed or panicked
    pub handler_failures: u64,
}

/// Live counters behind [`EventSystemStats`].
///
/// Registration is synchronous, so the counters are plain atomics instead of
/// an async lock.
#[derive(Debug, Default)]
pub(super) struct StatsCounters {
    total_handlers: AtomicU64,
    events_dispatched: AtomicU64,
    handler_failures: AtomicU64,
}

impl StatsCounters {
    pub(super) fn record_registration(&self) {
        self.total_handlers.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_dispatch(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_failures(&self, count: usize) {
        self.handler_failures
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> EventSystemStats {
        EventSystemStats {
            total_handlers: self.total_handlers.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }
}
