//! # Paddock Server - Controller Infrastructure
//!
//! The infrastructure half of the Paddock server controller. It connects to
//! the game server's remote-control endpoint, turns callbacks into typed
//! events and chat commands, and hosts the plugins that implement actual
//! features.
//!
//! ## Design Philosophy
//!
//! The controller core contains **no feature logic**. It provides:
//!
//! * **Remote connection** - [`JsonBridgeClient`] speaks newline-delimited JSON
//!   to a bridge next to the game server
//! * **Callback translation** - raw callbacks become [`paddock_event_system::Event`]s
//! * **Command routing** - chat lines starting with the prefix run bound commands
//! * **Plugin hosting** - static plugin table, whitelist, `Load` and `Unload`
//!
//! ## Message Flow
//!
//! 1. The game server pushes a callback `{method, params}`
//! 2. The callback is translated into one or more events, or a chat line
//! 3. Events are dispatched in order; command lines run on their own task
//! 4. Plugins answer through the shared [`paddock_event_system::RemoteClient`]
//!
//! ## Error Handling
//!
//! [`ServerError`] separates network, authentication, protocol and
//! configuration failures. Malformed callbacks never stop the loop; a lost
//! connection ends [`ControllerServer::run`] with a network error.

// Re-export core types for easy access
pub use bridge::JsonBridgeClient;
pub use config::ServerConfig;
pub use error::ServerError;
pub use messaging::{CallbackRouter, Routed};
pub use server::ControllerServer;

// Public module declarations
pub mod bridge;
pub mod config;
pub mod error;
pub mod messaging;
pub mod server;
