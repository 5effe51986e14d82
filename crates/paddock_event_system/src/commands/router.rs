use super::{parse_args, tokenize, CommandContext, CommandError, CommandRegistry};
use crate::remote::RemoteClient;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// A chat line as received from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub player_id: i32,
    pub login: String,
    pub text: String,
    /// Set by the server when it already recognised the line as a command
    pub is_registered_command: bool,
}

/// What routing a chat line amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Ordinary chat; the caller should dispatch it as a chat event
    NotACommand,
    /// No binding for the typed name; the player was told so
    Unknown(String),
    /// The handler ran to completion. `command` is the primary name even
    /// when the player typed an alias
    Executed { command: String, elapsed: Duration },
}

/// Recognises command lines and runs the bound handler.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    registry: Arc<CommandRegistry>,
    client: Arc<dyn RemoteClient>,
    prefix: char,
}

impl CommandRouter {
    pub fn new(registry: Arc<CommandRegistry>, client: Arc<dyn RemoteClient>, prefix: char) -> Self {
        Self {
            registry,
            client,
            prefix,
        }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    /// Whether `line` should be routed as a command instead of dispatched as chat.
    pub fn is_command(&self, line: &ChatLine) -> bool {
        line.is_registered_command || line.text.trim_start().starts_with(self.prefix)
    }

    /// Tokens of a command line, or `None` for ordinary chat.
    ///
    /// Lines flagged by the server but lacking the prefix are tokenized whole.
    pub fn tokens(&self, line: &ChatLine) -> Option<Vec<String>> {
        match parse_args(&line.text, self.prefix) {
            Some(tokens) => Some(tokens),
            None if line.is_registered_command => Some(tokenize(line.text.trim())),
            None => None,
        }
    }

    /// Routes one chat line.
    ///
    /// Unknown commands get a private `Unknown command '<name>'` reply. A known
    /// command runs to completion before this returns; its error, or a caught
    /// panic, is returned as-is and the binding stays registered.
    pub async fn route(&self, line: &ChatLine) -> Result<RouteOutcome, CommandError> {
        let Some(mut tokens) = self.tokens(line) else {
            return Ok(RouteOutcome::NotACommand);
        };

        let name = if tokens.is_empty() {
            String::new()
        } else {
            tokens.remove(0)
        };

        let Some(binding) = self.registry.lookup(&name) else {
            debug!("❓ {} invoked unknown command '{}'", line.login, name);
            self.client
                .chat_send_server_message_to_id(&format!("Unknown command '{}'", name), line.player_id)
                .await?;
            return Ok(RouteOutcome::Unknown(name));
        };

        let ctx = CommandContext::new(
            Arc::clone(&self.client),
            Arc::clone(&self.registry),
            line.player_id,
            line.login.clone(),
            name.clone(),
            tokens,
        );

        let handler = binding.handler();
        let started = Instant::now();
        let result = AssertUnwindSafe(handler.execute(ctx)).catch_unwind().await;
        let elapsed = started.elapsed();

        match result {
            Ok(Ok(())) => {
                info!("⚡ Running command '{}' took {}ms", name, elapsed.as_millis());
                Ok(RouteOutcome::Executed {
                    command: binding.name().to_string(),
                    elapsed,
                })
            }
            Ok(Err(e)) => {
                error!(
                    "❌ Command '{}' ({}) invoked by {} failed after {}ms: {}",
                    name,
                    binding.owner(),
                    line.login,
                    elapsed.as_millis(),
                    e
                );
                Err(e)
            }
            Err(_) => {
                error!(
                    "💥 Command '{}' ({}) invoked by {} panicked",
                    name,
                    binding.owner(),
                    line.login
                );
                Err(CommandError::Panicked(name))
            }
        }
    }
}
