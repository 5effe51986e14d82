//! # Server Context
//!
//! The [`ServerContext`] bundles the services a plugin needs while it runs:
//! the remote-control connection, the event bus (for custom events) and the
//! dialog correlator. Plugins receive it at registration time and usually
//! keep a clone inside their handlers.

use crate::dialog::DialogCorrelator;
use crate::remote::RemoteClient;
use crate::system::EventSystem;
use std::sync::Arc;

/// Services shared with every plugin. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct ServerContext {
    client: Arc<dyn RemoteClient>,
    events: Arc<EventSystem>,
    dialogs: Arc<DialogCorrelator>,
}

impl ServerContext {
    pub fn new(
        client: Arc<dyn RemoteClient>,
        events: Arc<EventSystem>,
        dialogs: Arc<DialogCorrelator>,
    ) -> Self {
        Self {
            client,
            events,
            dialogs,
        }
    }

    /// Connection to the game server.
    pub fn client(&self) -> Arc<dyn RemoteClient> {
        Arc::clone(&self.client)
    }

    /// The event bus, for dispatching custom events.
    pub fn events(&self) -> Arc<EventSystem> {
        Arc::clone(&self.events)
    }

    pub fn dialogs(&self) -> Arc<DialogCorrelator> {
        Arc::clone(&self.dialogs)
    }
}
