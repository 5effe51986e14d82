//! # Paddock Event System
//!
//! The core of the Paddock server controller: a typed event bus, a chat
//! command registry and router, and a correlator that turns "show a dialog to
//! a player" into an awaitable request/response exchange.
//!
//! ## Core Features
//!
//! - **Typed events**: a closed set of [`EventKind`]s, each with its own payload
//!   struct; handlers receive `Arc<Payload>` and never downcast
//! - **Parallel fan-out**: every handler of a dispatch runs concurrently; a
//!   failing or panicking handler never stops its siblings
//! - **Chat commands**: unique names and aliases, quote-aware argument parsing,
//!   per-invocation [`CommandContext`]
//! - **Dialog correlation**: [`DialogCorrelator::ask`] awaits the player's click
//!   with timeout and background cleanup
//!
//! ## Architecture Overview
//!
//! ```text
//! remote callbacks ─▶ translation ─▶ EventSystem ─▶ plugin handlers
//!                          │                 └────▶ DialogCorrelator
//!                          └─ chat command ─▶ CommandRouter ─▶ command handler
//! ```
//!
//! The translation layer and the connection itself live in `paddock_server`;
//! this crate only defines the [`RemoteClient`] interface they implement.
//!
//! ## Quick Start Example
//!
//! ```rust,no_run
//! use paddock_event_system::*;
//! use paddock_event_system::testing::RecordingClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client: Arc<dyn RemoteClient> = Arc::new(RecordingClient::new());
//!     let events = Arc::new(EventSystem::new());
//!     let dialogs = Arc::new(DialogCorrelator::new(client.clone(), DialogConfig::default()));
//!     dialogs.attach(&events);
//!
//!     events.on("example", |event: Arc<PlayerJoinEvent>| async move {
//!         println!("{} joined", event.login);
//!         Ok(true)
//!     });
//!
//!     let mut registry = CommandRegistry::new();
//!     registry.bind("ping", &[], "example", |ctx: CommandContext| async move {
//!         ctx.reply("Pong").await
//!     })?;
//!
//!     let router = CommandRouter::new(Arc::new(registry), client, '/');
//!     events.emit(PlayerJoinEvent { login: "alice".into(), is_spectator: false }).await?;
//!     router.route(&ChatLine {
//!         player_id: 1,
//!         login: "alice".into(),
//!         text: "/ping".into(),
//!         is_registered_command: false,
//!     }).await?;
//!     Ok(())
//! }
//! ```

// Core modules
pub mod commands;
pub mod context;
pub mod dialog;
pub mod events;
pub mod plugin;
pub mod remote;
pub mod shutdown;
pub mod system;
pub mod testing;
pub mod utils;

// Re-export commonly used items for convenience
pub use commands::{
    parse_args, tokenize, ChatLine, CommandBinding, CommandContext, CommandError, CommandHandler,
    CommandRegistry, CommandRouter, RouteOutcome,
};
pub use context::ServerContext;
pub use dialog::{DialogConfig, DialogCorrelator, DialogError, DialogOutcome, PendingAnswer};
pub use events::{
    CheckpointEvent, CustomEvent, DialogAnswerEvent, DialogEntry, Event, EventError, EventHandler,
    EventKind, EventPayload, FinishEvent, HandlerFailure, LoadEvent, PlayerChatEvent,
    PlayerDisconnectEvent, PlayerInfoChangedEvent, PlayerJoinEvent, TypedEventHandler,
    UnloadEvent, WaypointEvent,
};
pub use plugin::{Plugin, PluginError, Registrar};
pub use remote::{MapInfo, PlayerInfo, RemoteCallback, RemoteClient, RemoteError};
pub use shutdown::ShutdownState;
pub use system::{DispatchReport, EventSystem, EventSystemStats};
pub use utils::{current_timestamp, format_race_time};

// External dependencies that plugins commonly need
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use serde_json;

/// Crate version, reported in the startup banner.
pub const PADDOCK_VERSION: &str = env!("CARGO_PKG_VERSION");
