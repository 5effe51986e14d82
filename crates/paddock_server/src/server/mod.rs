//! Core server implementation and lifecycle management.
//!
//! This module contains the main controller structure and the logic that
//! drives the game server connection from startup to shutdown.

pub mod core;

pub use core::ControllerServer;
