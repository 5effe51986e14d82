//! # Plugin Interface
//!
//! Plugins are registered statically by the host. At startup each plugin's
//! [`Plugin::register`] runs once with a [`Registrar`] through which it
//! subscribes event handlers and binds chat commands. After registration the
//! command registry is frozen; handlers and commands stay for the lifetime of
//! the process.
//!
//! A command name collision fails registration and aborts startup.

use crate::commands::{CommandContext, CommandError, CommandRegistry};
use crate::context::ServerContext;
use crate::events::{EventError, EventPayload};
use std::future::Future;
use std::sync::Arc;

// ============================================================================
// Plugin Development Interface
// ============================================================================

/// An extension module hosted by Paddock.
///
/// # Examples
///
/// ```rust,no_run
/// use paddock_event_system::*;
/// use std::sync::Arc;
///
/// struct Hello;
///
/// impl Plugin for Hello {
///     fn name(&self) -> &str { "hello" }
///     fn version(&self) -> &str { "1.0.0" }
///
///     fn register(&self, registrar: &mut Registrar<'_>) -> Result<(), PluginError> {
///         registrar.on(|event: Arc<PlayerJoinEvent>| async move {
///             println!("{} joined", event.login);
///             Ok(true)
///         });
///         registrar.command("hello", &["hi"], |ctx: CommandContext| async move {
///             ctx.reply("Hello!").await
///         })?;
///         Ok(())
///     }
/// }
/// ```
pub trait Plugin: Send + Sync + 'static {
    /// Unique plugin name
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Subscribes handlers and binds commands.
    fn register(&self, registrar: &mut Registrar<'_>) -> Result<(), PluginError>;
}

/// Registration surface handed to [`Plugin::register`].
pub struct Registrar<'a> {
    plugin: String,
    context: &'a ServerContext,
    commands: &'a mut CommandRegistry,
}

impl<'a> Registrar<'a> {
    pub fn new(plugin: &str, context: &'a ServerContext, commands: &'a mut CommandRegistry) -> Self {
        Self {
            plugin: plugin.to_string(),
            context,
            commands,
        }
    }

    /// Name of the plugin currently registering.
    pub fn plugin_name(&self) -> &str {
        &self.plugin
    }

    pub fn context(&self) -> &ServerContext {
        self.context
    }

    /// Subscribes a typed handler on the event bus.
    ///
    /// Handlers run one at a time inside the dispatch loop. A handler that
    /// needs a dialog answer must `tokio::spawn` the [`DialogCorrelator::ask`]
    /// call, since the answer arrives through a later dispatch.
    ///
    /// [`DialogCorrelator::ask`]: crate::DialogCorrelator::ask
    pub fn on<E, F, Fut>(&mut self, handler: F)
    where
        E: EventPayload,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, EventError>> + Send + 'static,
    {
        self.context.events().on(&self.plugin, handler);
    }

    /// Binds a chat command under `name` and `aliases`.
    pub fn command<F, Fut>(&mut self, name: &str, aliases: &[&str], handler: F) -> Result<(), PluginError>
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
    {
        self.commands.bind(name, aliases, &self.plugin, handler)?;
        Ok(())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by plugins.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Plugin initialization failed during startup
    #[error("Plugin initialization failed: {0}")]
    InitializationFailed(String),
    /// A command could not be bound
    #[error("Command registration failed: {0}")]
    Command(#[from] CommandError),
    /// Error occurred during plugin execution
    #[error("Plugin execution error: {0}")]
    ExecutionError(String),
}
