//! Error types and handling for the controller server.
//!
//! This module defines the error types that can occur during server operations,
//! providing clear categorization of different failure modes.

use paddock_event_system::RemoteError;
use plugin_system::PluginSystemError;

/// Enumeration of possible server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as connection loss
    #[error("Network error: {0}")]
    Network(String),

    /// The game server rejected our credentials
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// A callback carried arguments we could not make sense of
    #[error("Protocol error in {method}: {message}")]
    Protocol { method: String, message: String },

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginSystemError),
}

impl ServerError {
    pub(crate) fn protocol(method: &str, message: impl Into<String>) -> Self {
        Self::Protocol {
            method: method.to_string(),
            message: message.into(),
        }
    }
}
