//! # Paddock - Server Controller Entry Point
//!
//! Connects to a dedicated racing game server over its remote-control
//! protocol and runs the built-in plugins against it. This entry point
//! handles CLI parsing, configuration loading, logging and the application
//! lifecycle.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! paddock
//!
//! # Specify custom configuration
//! paddock --config production.toml
//!
//! # Override specific settings
//! paddock --host 10.0.0.2 --port 5001 --log-level debug --json-logs
//! ```
//!
//! ## Configuration
//!
//! The controller loads configuration from a TOML file (default: `config.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! SIGINT (Ctrl+C) and SIGTERM start a graceful shutdown: plugins receive
//! `Unload`, then the connection is closed. A second signal exits at once.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

pub use app::{builtin_plugins, Application};
pub use cli::CliArgs;
pub use config::{AppConfig, LoggingSettings, PluginSettings, ServerSettings};

/// Runs the controller until shutdown.
///
/// # Exit Codes
///
/// * **0**: Clean shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging settings come from the file before the application validates it.
    let mut config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();
    config.apply_cli(&args);

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
