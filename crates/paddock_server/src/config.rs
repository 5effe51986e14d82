//! Server configuration types and defaults.
//!
//! This module contains the configuration the controller server needs to
//! reach the game server and run its plugins.

use paddock_event_system::DialogConfig;
use serde::{Deserialize, Serialize};

/// Configuration structure for the controller server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host of the remote-control endpoint
    pub host: String,

    /// Port of the remote-control endpoint
    pub port: u16,

    /// Super-admin credentials used to authenticate
    pub user: String,
    pub password: String,

    /// Connection attempt timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// How long a single remote call may wait for its reply, in milliseconds
    pub request_timeout_ms: u64,

    /// Character that marks a chat line as a command
    pub command_prefix: char,

    /// Plugins to load; empty loads every available plugin
    pub plugins: Vec<String>,

    /// Dialog correlation timing
    pub dialogs: DialogConfig,
}

impl ServerConfig {
    /// `host:port` of the remote-control endpoint.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            user: "SuperAdmin".to_string(),
            password: "SuperAdmin".to_string(),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 10_000,
            command_prefix: '/',
            plugins: Vec::new(),
            dialogs: DialogConfig::default(),
        }
    }
}
