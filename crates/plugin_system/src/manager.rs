//! Plugin manager implementation.

use crate::error::PluginSystemError;
use paddock_event_system::{
    CommandRegistry, DispatchReport, LoadEvent, Plugin, Registrar, ServerContext, UnloadEvent,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Manages the lifecycle of statically registered plugins.
///
/// The `PluginManager` handles:
/// - Collecting the plugin table and rejecting duplicate names
/// - Whitelist filtering
/// - Registration of event handlers and commands
/// - `Load` after startup and `Unload` at shutdown
pub struct PluginManager {
    /// Services handed to plugins during registration
    context: ServerContext,
    /// Every known plugin, in the order it was added
    plugins: Vec<Arc<dyn Plugin>>,
    /// Names of the plugins that registered successfully
    loaded: Vec<String>,
}

impl PluginManager {
    /// Creates a new plugin manager with no plugins.
    pub fn new(context: ServerContext) -> Self {
        Self {
            context,
            plugins: Vec::new(),
            loaded: Vec::new(),
        }
    }

    /// Adds a plugin to the table.
    pub fn add(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), PluginSystemError> {
        if self.plugins.iter().any(|known| known.name() == plugin.name()) {
            return Err(PluginSystemError::PluginAlreadyExists(
                plugin.name().to_string(),
            ));
        }

        debug!("🔍 Found plugin {} v{}", plugin.name(), plugin.version());
        self.plugins.push(plugin);
        Ok(())
    }

    /// Registers every enabled plugin against `registry`.
    ///
    /// An empty `whitelist` enables all plugins. Plugins register in table
    /// order; the first failure aborts loading and is returned. Returns the
    /// number of plugins loaded.
    pub fn load_all(
        &mut self,
        registry: &mut CommandRegistry,
        whitelist: &[String],
    ) -> Result<usize, PluginSystemError> {
        if !self.loaded.is_empty() {
            return Err(PluginSystemError::AlreadyLoaded);
        }

        if let Some(unknown) = whitelist
            .iter()
            .find(|name| !self.plugins.iter().any(|plugin| plugin.name() == name.as_str()))
        {
            error!("❌ Whitelisted plugin {} is not available", unknown);
            return Err(PluginSystemError::PluginNotFound(unknown.clone()));
        }

        info!("🔌 Loading plugins ({} available)", self.plugins.len());

        for plugin in &self.plugins {
            let plugin_name = plugin.name();

            if !whitelist.is_empty() && !whitelist.iter().any(|name| name == plugin_name) {
                info!("⏭️ Skipping plugin {} (not whitelisted)", plugin_name);
                continue;
            }

            info!("🔧 Registering plugin: {} v{}", plugin_name, plugin.version());
            let mut registrar = Registrar::new(plugin_name, &self.context, registry);

            if let Err(e) = plugin.register(&mut registrar) {
                error!("❌ Failed to register plugin {}: {}", plugin_name, e);
                return Err(PluginSystemError::Registration {
                    plugin: plugin_name.to_string(),
                    source: e,
                });
            }

            info!("✅ Plugin registered successfully: {}", plugin_name);
            self.loaded.push(plugin_name.to_string());
        }

        info!(
            "🎉 Plugin loading complete: {}/{} plugins loaded, {} command(s) bound",
            self.loaded.len(),
            self.plugins.len(),
            registry.len()
        );
        Ok(self.loaded.len())
    }

    /// Dispatches the `Load` event once every plugin has registered.
    pub async fn dispatch_load(&self) -> Result<DispatchReport, PluginSystemError> {
        info!("🚀 Dispatching load to {} plugin(s)", self.loaded.len());
        Ok(self.context.events().emit(LoadEvent).await?)
    }

    /// Dispatches the `Unload` event so plugins can flush their state.
    ///
    /// Handler failures are logged and reported but every handler still runs.
    pub async fn shutdown(&self) -> Result<(), PluginSystemError> {
        info!("🛑 Shutting down {} plugins", self.loaded.len());

        match self.context.events().emit(UnloadEvent).await {
            Ok(report) => {
                info!("🧹 Plugin cleanup completed ({} handler(s))", report.handlers_invoked);
                Ok(())
            }
            Err(e) => {
                warn!("⚠️ Plugin shutdown finished with errors: {}", e);
                Err(e.into())
            }
        }
    }

    /// Number of plugins that registered successfully.
    pub fn plugin_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.loaded.clone()
    }

    pub fn is_plugin_loaded(&self, plugin_name: &str) -> bool {
        self.loaded.iter().any(|name| name == plugin_name)
    }

    pub fn context(&self) -> &ServerContext {
        &self.context
    }
}
