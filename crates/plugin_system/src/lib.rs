//! Plugin system for static registration and management of controller plugins.
//!
//! Plugins are compiled into the host and handed to the [`PluginManager`] as a
//! table. The manager filters them through the configured whitelist, runs each
//! plugin's registration against the shared command registry, and dispatches
//! the `Load` and `Unload` lifecycle events.

mod error;
mod manager;

pub use error::PluginSystemError;
pub use manager::PluginManager;

/// Re-export commonly used types for plugin development
pub use paddock_event_system::{Plugin, PluginError, Registrar, ServerContext};
