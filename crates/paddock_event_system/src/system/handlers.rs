/// Event handler registration methods
use crate::events::{EventError, EventHandler, EventKind, EventPayload, TypedEventHandler};
use super::core::EventSystem;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

impl EventSystem {
    /// Registers a typed async handler for events of kind `E::KIND`.
    ///
    /// The handler receives the shared payload and reports whether it
    /// meaningfully acted on the event. `owner` names the registering plugin
    /// and shows up in failure logs.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use paddock_event_system::{EventSystem, PlayerJoinEvent};
    /// use std::sync::Arc;
    ///
    /// let events = EventSystem::new();
    /// events.on("greeter", |event: Arc<PlayerJoinEvent>| async move {
    ///     println!("{} joined", event.login);
    ///     Ok(true)
    /// });
    /// ```
    pub fn on<E, F, Fut>(&self, owner: &str, handler: F)
    where
        E: EventPayload,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, EventError>> + Send + 'static,
    {
        let handler_name = format!("{}::{}", owner, E::KIND);
        let typed_handler = TypedEventHandler::<E, F>::new(handler_name, handler);
        self.register(E::KIND, Arc::new(typed_handler));
    }

    /// Appends a handler to the list for `kind`.
    ///
    /// Registration never fails and handlers are never removed. A handler
    /// whose own kind differs from `kind` will answer every dispatch with
    /// [`EventError::KindMismatch`].
    pub fn register(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        if handler.kind() != kind {
            warn!(
                "⚠️ Handler {} expects {} events but is registered for {}",
                handler.handler_name(),
                handler.kind(),
                kind
            );
        }

        info!("📝 Registered handler {} for {}", handler.handler_name(), kind);

        self.handlers.entry(kind).or_default().push(handler);
        self.stats.record_registration();
    }
}
