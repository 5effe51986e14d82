//! Main application logic and lifecycle management.
//!
//! [`Application`] turns the merged configuration into a connected
//! [`ControllerServer`] with the built-in plugins and runs it until a
//! shutdown signal arrives or the game server goes away.

use crate::{cli::CliArgs, config::AppConfig, logging::display_banner, signals::spawn_signal_handler};
use paddock_event_system::{EventSystem, Plugin, ShutdownState};
use paddock_server::{ControllerServer, JsonBridgeClient};
use plugin_admin::AdminPlugin;
use plugin_greeter::GreeterPlugin;
use plugin_local_records::{InMemoryRecordStore, LocalRecordsPlugin};
use plugin_player::PlayerPlugin;
use std::sync::Arc;
use tracing::info;

/// Builds every plugin shipped with the controller.
///
/// The whitelist is applied later by the plugin manager, so all of them are
/// constructed here even when only some will be loaded.
pub async fn builtin_plugins(
    config: &AppConfig,
) -> Result<Vec<Arc<dyn Plugin>>, Box<dyn std::error::Error>> {
    let records = match &config.plugins.records_file {
        Some(path) => LocalRecordsPlugin::new(Arc::new(InMemoryRecordStore::open(path).await?)),
        None => LocalRecordsPlugin::in_memory(),
    };

    Ok(vec![
        Arc::new(AdminPlugin::new(config.plugins.admins.clone())),
        Arc::new(greeter(config)),
        Arc::new(PlayerPlugin::new()),
        Arc::new(records),
    ])
}

/// Greeter with the configured rules and the configured dialog timeout for `/rules`.
pub fn greeter(config: &AppConfig) -> GreeterPlugin {
    let greeter = GreeterPlugin::new().with_rules_timeout(config.dialogs.default_timeout());
    if config.plugins.rules.is_empty() {
        greeter
    } else {
        greeter.with_rules(config.plugins.rules.clone())
    }
}

pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    server: ControllerServer,
}

impl Application {
    /// Loads and validates the configuration, then wires the controller and
    /// registers its plugins.
    ///
    /// Nothing connects to the game server until [`Application::run`].
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;
        config.apply_cli(&args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let server_config = config.to_server_config()?;
        let client = Arc::new(JsonBridgeClient::from_config(&server_config));
        let mut server = ControllerServer::new(server_config, client);

        for plugin in builtin_plugins(&config).await? {
            server.add_plugin(plugin)?;
        }
        let loaded = server.load_plugins()?;
        info!("🔌 {} plugin(s) registered", loaded);

        Ok(Self { config, server })
    }

    pub fn server(&self) -> &ControllerServer {
        &self.server
    }

    /// Runs the controller until shutdown and reports how it ended.
    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.log_configuration_summary();

        let shutdown = ShutdownState::new();
        let signals = spawn_signal_handler(shutdown.clone());
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        let outcome = self.server.run(shutdown).await;
        signals.abort();

        log_final_statistics(self.server.events());

        outcome?;
        info!("👋 Paddock shutdown complete");
        Ok(())
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!(
            "  🌐 Game server: {}:{}",
            self.config.server.host, self.config.server.port
        );
        info!("  💬 Command prefix: {}", self.config.server.command_prefix);
        if self.config.plugins.whitelist.is_empty() {
            info!("  🔌 Plugins: all built-in plugins");
        } else {
            info!("  🔌 Plugins: {:?}", self.config.plugins.whitelist);
        }
        info!("  👥 Admins: {}", self.config.plugins.admins.len());
        info!(
            "  ⌛ Dialog timeout: {}ms (+{}ms grace)",
            self.config.dialogs.default_timeout_ms, self.config.dialogs.grace_ms
        );
    }
}

fn log_final_statistics(events: &EventSystem) {
    let stats = events.get_stats();
    info!("📊 Final Statistics:");
    info!("  - Events dispatched: {}", stats.events_dispatched);
    info!("  - Handlers registered: {}", stats.total_handlers);
    info!("  - Handler failures: {}", stats.handler_failures);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_builtin_plugins_have_distinct_names() {
        let plugins = builtin_plugins(&AppConfig::default()).await.unwrap();
        let names: Vec<&str> = plugins.iter().map(|plugin| plugin.name()).collect();
        assert_eq!(names, vec!["admin", "greeter", "player", "local_records"]);
    }

    #[test]
    fn test_greeter_takes_dialog_timeout_and_rules_from_config() {
        let mut config = AppConfig::default();
        config.dialogs.default_timeout_ms = 45_000;
        config.plugins.rules = vec!["No ramming.".to_string()];

        let greeter = greeter(&config);
        assert_eq!(greeter.rules_timeout(), Duration::from_secs(45));
        assert_eq!(greeter.rules(), ["No ramming.".to_string()]);

        let defaults = super::greeter(&AppConfig::default());
        assert_eq!(defaults.rules_timeout(), Duration::from_secs(10));
        assert_eq!(defaults.rules().len(), 3);
    }

    #[tokio::test]
    async fn test_builtin_plugins_use_records_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        tokio::fs::write(&path, "{}").await.unwrap();

        let mut config = AppConfig::default();
        config.plugins.records_file = Some(path.to_string_lossy().to_string());
        assert_eq!(builtin_plugins(&config).await.unwrap().len(), 4);

        tokio::fs::write(&path, "[").await.unwrap();
        assert!(builtin_plugins(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_application_wires_plugins_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("paddock.toml");
        let args = CliArgs::try_parse_from([
            "paddock",
            "--config",
            config_path.to_str().unwrap(),
            "--port",
            "5123",
        ])
        .unwrap();

        let app = Application::new(args).await.unwrap();

        assert!(config_path.exists());
        assert_eq!(app.server().config().port, 5123);
        assert_eq!(app.server().plugin_manager().plugin_count(), 4);
    }

    #[tokio::test]
    async fn test_application_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("paddock.toml");
        tokio::fs::write(&config_path, "[logging]\nlevel = \"loud\"\n")
            .await
            .unwrap();
        let args = CliArgs::try_parse_from(["paddock", "-c", config_path.to_str().unwrap()]).unwrap();

        assert!(Application::new(args).await.is_err());
    }
}
