//! Configuration management for the Paddock controller.
//!
//! This module handles loading, validation, and conversion of the controller
//! configuration from TOML files and command-line arguments.

use crate::cli::CliArgs;
use paddock_event_system::DialogConfig;
use paddock_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Application configuration loaded from TOML file.
///
/// Every section may be omitted; missing values take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Game server connection settings
    pub server: ServerSettings,
    /// Plugin selection and plugin-specific settings
    pub plugins: PluginSettings,
    /// Dialog answer correlation timing
    pub dialogs: DialogConfig,
    /// Logging configuration settings
    pub logging: LoggingSettings,
}

/// Remote-control endpoint of the game server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Super-admin login used to authenticate
    pub user: String,
    pub password: String,
    /// Connection attempt timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Timeout of a single remote call in milliseconds
    pub request_timeout_ms: u64,
    /// Single character that starts a chat command
    pub command_prefix: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let defaults = ServerConfig::default();
        Self {
            host: defaults.host,
            port: defaults.port,
            user: defaults.user,
            password: defaults.password,
            connect_timeout_ms: defaults.connect_timeout_ms,
            request_timeout_ms: defaults.request_timeout_ms,
            command_prefix: defaults.command_prefix.to_string(),
        }
    }
}

/// Plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    /// Plugin whitelist - if non-empty, only these plugins will be loaded
    pub whitelist: Vec<String>,
    /// Logins allowed to use admin commands
    pub admins: Vec<String>,
    /// Rule lines shown by `/rules`; empty keeps the built-in rules
    pub rules: Vec<String>,
    /// JSON file local records are saved to; records stay in memory when unset
    pub records_file: Option<String>,
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, writing a default file first if none exists.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("📝 Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Applies command-line overrides on top of the file values.
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(host) = &args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if args.json_logs {
            self.logging.json_format = true;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.host.trim().is_empty() {
            return Err("Server host cannot be empty".to_string());
        }

        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.server.user.is_empty() {
            return Err("Server user cannot be empty".to_string());
        }

        if self.server.request_timeout_ms == 0 || self.server.connect_timeout_ms == 0 {
            return Err("Server timeouts must be greater than 0".to_string());
        }

        self.command_prefix()?;

        if self.dialogs.reap_interval_ms == 0 {
            return Err("dialogs.reap_interval_ms must be greater than 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }

    fn command_prefix(&self) -> Result<char, String> {
        let mut chars = self.server.command_prefix.chars();
        match (chars.next(), chars.next()) {
            (Some(prefix), None) if !prefix.is_whitespace() => Ok(prefix),
            _ => Err(format!(
                "Command prefix must be a single non-space character, got '{}'",
                self.server.command_prefix
            )),
        }
    }

    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        self.validate()?;

        Ok(ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            user: self.server.user.clone(),
            password: self.server.password.clone(),
            connect_timeout_ms: self.server.connect_timeout_ms,
            request_timeout_ms: self.server.request_timeout_ms,
            command_prefix: self.command_prefix()?,
            plugins: self.plugins.whitelist.clone(),
            dialogs: self.dialogs,
        })
    }
}
