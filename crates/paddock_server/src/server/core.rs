//! Core controller server implementation.
//!
//! This module contains the main `ControllerServer` struct, which owns the
//! event system, the dialog correlator and the plugin manager, and drives the
//! connection to the game server from login to shutdown.

use crate::{config::ServerConfig, error::ServerError, messaging::CallbackRouter};
use paddock_event_system::{
    CommandRegistry, CommandRouter, DialogCorrelator, EventSystem, Plugin, RemoteClient,
    ServerContext, ShutdownState,
};
use plugin_system::PluginManager;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Mode script event that switches on script callbacks such as waypoints.
const ENABLE_SCRIPT_CALLBACKS: &str = "XmlRpc.EnableCallbacks";

/// The controller server.
///
/// `ControllerServer` connects to the game server, turns its callbacks into
/// events and chat commands, and hosts the plugins that react to them. It
/// contains no game logic itself.
///
/// # Lifecycle
///
/// 1. [`ControllerServer::add_plugin`] for every statically known plugin
/// 2. [`ControllerServer::load_plugins`] registers handlers and commands, then
///    freezes the command registry
/// 3. [`ControllerServer::run`] connects, dispatches `Load`, processes
///    callbacks until shutdown, dispatches `Unload` and disconnects
pub struct ControllerServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Connection to the game server
    client: Arc<dyn RemoteClient>,

    /// The event system for plugin communication
    events: Arc<EventSystem>,

    /// Correlates dialog answers with the requests awaiting them
    dialogs: Arc<DialogCorrelator>,

    /// Manager for registering and unloading plugins
    plugin_manager: PluginManager,

    /// Available once plugins are loaded and the command registry is frozen
    router: Option<CallbackRouter>,
}

impl ControllerServer {
    /// Creates a new controller talking to the game server through `client`.
    ///
    /// The dialog correlator is attached to the event system right away, so
    /// its answer handler is always the first `DialogAnswer` subscriber.
    pub fn new(config: ServerConfig, client: Arc<dyn RemoteClient>) -> Self {
        let events = Arc::new(EventSystem::new());
        let dialogs = Arc::new(DialogCorrelator::new(
            Arc::clone(&client),
            config.dialogs,
        ));
        dialogs.attach(&events);

        let context = ServerContext::new(Arc::clone(&client), Arc::clone(&events), Arc::clone(&dialogs));
        let plugin_manager = PluginManager::new(context);

        Self {
            config,
            client,
            events,
            dialogs,
            plugin_manager,
            router: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventSystem> {
        &self.events
    }

    pub fn dialogs(&self) -> &Arc<DialogCorrelator> {
        &self.dialogs
    }

    pub fn plugin_manager(&self) -> &PluginManager {
        &self.plugin_manager
    }

    /// The callback router, once plugins are loaded.
    pub fn router(&self) -> Option<&CallbackRouter> {
        self.router.as_ref()
    }

    /// Adds a plugin to the table. Plugins register in the order they were added.
    pub fn add_plugin(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), ServerError> {
        self.plugin_manager.add(plugin)?;
        Ok(())
    }

    /// Registers every whitelisted plugin and freezes the command registry.
    ///
    /// A duplicate command name, or any other registration failure, aborts
    /// startup. Returns the number of plugins loaded.
    pub fn load_plugins(&mut self) -> Result<usize, ServerError> {
        if self.router.is_some() {
            return Err(ServerError::Configuration(
                "plugins are already loaded".to_string(),
            ));
        }

        let mut registry = CommandRegistry::new();
        let loaded = self
            .plugin_manager
            .load_all(&mut registry, &self.config.plugins)?;

        let commands = CommandRouter::new(
            Arc::new(registry),
            Arc::clone(&self.client),
            self.config.command_prefix,
        );
        self.router = Some(CallbackRouter::new(Arc::clone(&self.events), commands));

        Ok(loaded)
    }

    /// Runs the controller until shutdown is initiated or the connection drops.
    ///
    /// Plugins are loaded first if [`ControllerServer::load_plugins`] has not
    /// been called. Malformed callbacks are logged and skipped. `Unload` is
    /// dispatched on every exit path that got past `Load`, and the shutdown
    /// state is marked complete once the connection is closed.
    pub async fn run(&mut self, shutdown: ShutdownState) -> Result<(), ServerError> {
        info!("🚀 Starting Paddock controller for {}", self.config.address());

        if self.router.is_none() {
            self.load_plugins()?;
        }
        let router = self
            .router
            .clone()
            .ok_or_else(|| ServerError::Internal("callback router missing after plugin load".to_string()))?;

        self.client
            .connect()
            .await
            .map_err(|e| ServerError::Network(e.to_string()))?;
        self.client
            .authenticate(&self.config.user, &self.config.password)
            .await
            .map_err(|e| ServerError::Authentication(e.to_string()))?;
        self.client.enable_callbacks(true).await?;

        if let Err(e) = self
            .client
            .call(
                "TriggerModeScriptEventArray",
                vec![json!(ENABLE_SCRIPT_CALLBACKS), json!(["true"])],
            )
            .await
        {
            warn!("⚠️ Could not enable mode script callbacks: {}", e);
        }

        let mut callbacks = self
            .client
            .take_callbacks()
            .ok_or_else(|| ServerError::Internal("callback stream was already taken".to_string()))?;

        let reaper = self.dialogs.spawn_reaper(shutdown.clone());

        if let Err(e) = self.plugin_manager.dispatch_load().await {
            warn!("⚠️ Load finished with errors: {}", e);
        }

        info!(
            "🎉 Controller running with {} plugin(s): {:?}",
            self.plugin_manager.plugin_count(),
            self.plugin_manager.plugin_names()
        );

        let outcome = loop {
            tokio::select! {
                _ = shutdown.wait_for_shutdown() => {
                    info!("🛑 Shutdown requested, leaving callback loop");
                    break Ok(());
                }
                callback = callbacks.recv() => match callback {
                    Some(callback) => {
                        if let Err(e) = router.route(&callback).await {
                            warn!("⚠️ Skipping callback {}: {}", callback.method, e);
                        }
                    }
                    None if shutdown.is_shutdown_initiated() => break Ok(()),
                    None => {
                        error!("❌ Connection to the game server was lost");
                        break Err(ServerError::Network("callback stream closed".to_string()));
                    }
                },
            }
        };

        // The reaper exits at its next wake-up once shutdown is initiated.
        shutdown.initiate_shutdown();

        if let Err(e) = self.plugin_manager.shutdown().await {
            warn!("⚠️ Unload finished with errors: {}", e);
        }

        let reap_wait = self.config.dialogs.reap_interval() * 2;
        if tokio::time::timeout(reap_wait, reaper).await.is_err() {
            debug!("Dialog reaper did not stop within {}ms", reap_wait.as_millis());
        }

        if let Err(e) = self.client.disconnect().await {
            warn!("⚠️ Disconnect failed: {}", e);
        }

        shutdown.complete_shutdown();
        outcome
    }
}
