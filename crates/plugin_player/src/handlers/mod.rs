//! # Event Handler Modules
//!
//! Handlers wired up by [`crate::PlayerPlugin`]:
//!
//! - [`connection`] - player lifecycle (load, join, info changes, disconnect)
//!   keeping the player cache and the chat roster current
//! - [`communication`] - chat relay while manual routing is on, plus the
//!   `/chat` and `/chatformat` commands

pub mod communication;
pub mod connection;

pub use communication::*;
pub use connection::*;
