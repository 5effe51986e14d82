//! Error types for the plugin system.

use paddock_event_system::{EventError, PluginError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PluginSystemError {
    /// A plugin's registration failed; startup cannot continue
    #[error("Plugin {plugin} failed to register: {source}")]
    Registration {
        plugin: String,
        #[source]
        source: PluginError,
    },

    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    #[error("Event system error: {0}")]
    EventSystemError(#[from] EventError),

    #[error("Plugin already exists: {0}")]
    PluginAlreadyExists(String),

    #[error("Plugins were already loaded")]
    AlreadyLoaded,
}
