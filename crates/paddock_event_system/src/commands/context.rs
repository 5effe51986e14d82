use super::{CommandError, CommandRegistry};
use crate::remote::RemoteClient;
use std::fmt;
use std::sync::Arc;

/// Everything a command handler gets for one invocation.
#[derive(Clone)]
pub struct CommandContext {
    /// Connection to the game server
    pub client: Arc<dyn RemoteClient>,
    /// Numeric id of the invoking player
    pub player_id: i32,
    /// Login of the invoking player
    pub login: String,
    /// Name the player typed, which may be an alias
    pub command: String,
    /// Positional arguments following the command name
    pub args: Vec<String>,
    registry: Arc<CommandRegistry>,
}

impl CommandContext {
    pub fn new(
        client: Arc<dyn RemoteClient>,
        registry: Arc<CommandRegistry>,
        player_id: i32,
        login: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            client,
            player_id,
            login: login.into(),
            command: command.into(),
            args,
            registry,
        }
    }

    /// Read-only view of the registered commands.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Sends a private chat message to the invoking player.
    pub async fn reply(&self, message: &str) -> Result<(), CommandError> {
        self.client
            .chat_send_server_message_to_id(message, self.player_id)
            .await?;
        Ok(())
    }

    /// Builds an execution error attributed to this command.
    pub fn fail(&self, message: impl Into<String>) -> CommandError {
        CommandError::execution(self.command.clone(), message)
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("player_id", &self.player_id)
            .field("login", &self.login)
            .field("command", &self.command)
            .field("args", &self.args)
            .finish()
    }
}
