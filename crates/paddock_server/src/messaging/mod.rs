//! Callback handling for server-to-controller communication.
//!
//! This module translates raw remote callbacks into typed events and routes
//! them to the event system or, for chat commands, to the command router.

pub mod router;
pub mod translate;

pub use router::{CallbackRouter, Routed};
pub use translate::{translate, Translated};
