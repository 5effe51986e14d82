/// Event dispatch methods
use crate::events::{Event, EventError, EventKind, EventPayload, HandlerFailure};
use super::core::EventSystem;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Outcome of a dispatch in which every handler succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub kind: EventKind,
    /// Number of handlers that ran
    pub handlers_invoked: usize,
    /// Number of handlers that reported they acted on the event
    pub handled: usize,
}

impl EventSystem {
    /// Dispatches an event to every handler registered for its kind.
    ///
    /// All handlers receive the same instance and run concurrently; the call
    /// returns once every one of them has completed. A handler that fails or
    /// panics does not stop its siblings. Failures are logged and returned
    /// together as [`EventError::HandlersFailed`]. No handlers is a successful
    /// no-op.
    pub async fn dispatch(&self, event: Event) -> Result<DispatchReport, EventError> {
        let kind = event.kind();
        let event_handlers = self
            .handlers
            .get(&kind)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        self.stats.record_dispatch();

        if event_handlers.is_empty() {
            trace!("No handlers for {} event", kind);
            return Ok(DispatchReport {
                kind,
                handlers_invoked: 0,
                handled: 0,
            });
        }

        debug!("📤 Dispatching {} to {} handlers", kind, event_handlers.len());

        let event = &event;
        let mut futures = FuturesUnordered::new();

        for handler in event_handlers.iter() {
            let handler = Arc::clone(handler);
            futures.push(async move {
                let outcome = AssertUnwindSafe(handler.handle(event)).catch_unwind().await;
                (handler, outcome)
            });
        }

        let mut handled = 0;
        let mut failures = Vec::new();

        while let Some((handler, outcome)) = futures.next().await {
            match outcome {
                Ok(Ok(true)) => handled += 1,
                Ok(Ok(false)) => {}
                Ok(Err(e)) => {
                    error!("❌ Handler {} failed: {}", handler.handler_name(), e);
                    failures.push(HandlerFailure {
                        handler: handler.handler_name().to_string(),
                        error: e.to_string(),
                    });
                }
                Err(_) => {
                    let e = EventError::HandlerPanicked(handler.handler_name().to_string());
                    error!("💥 {} while handling {} event", e, kind);
                    failures.push(HandlerFailure {
                        handler: handler.handler_name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(DispatchReport {
                kind,
                handlers_invoked: event_handlers.len(),
                handled,
            })
        } else {
            self.stats.record_failures(failures.len());
            Err(EventError::HandlersFailed {
                kind,
                total: event_handlers.len(),
                failures,
            })
        }
    }

    /// Wraps a payload into its event and dispatches it.
    #[inline]
    pub async fn emit<E: EventPayload>(&self, payload: E) -> Result<DispatchReport, EventError> {
        self.dispatch(Event::new(payload)).await
    }
}
