//! # Chat Commands
//!
//! Players invoke commands by typing a prefixed line in chat, e.g.
//! `/kick "John Doe" afk`. This module holds the pieces that make that work:
//!
//! - [`CommandRegistry`]: name and alias bindings, guarded against collisions
//! - [`parse_args`]: the quote-aware tokenizer
//! - [`CommandContext`]: what a handler gets for one invocation
//! - [`CommandRouter`]: recognises command lines and runs the bound handler
//!
//! The registry is filled while plugins register and is then frozen into an
//! `Arc`; routing only ever reads it.

mod args;
mod context;
mod registry;
mod router;

pub use args::{parse_args, tokenize};
pub use context::CommandContext;
pub use registry::{CommandBinding, CommandHandler, CommandRegistry};
pub use router::{ChatLine, CommandRouter, RouteOutcome};

use crate::dialog::DialogError;
use crate::remote::RemoteError;

/// Errors raised while binding or executing commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// A name or alias is already bound, or repeats within one binding
    #[error("Command name '{name}' is already registered")]
    DuplicateCommand { name: String },
    #[error("Invalid command name '{0}'")]
    InvalidName(String),
    /// The handler reported a failure
    #[error("Command '{command}' failed: {message}")]
    Execution { command: String, message: String },
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),
    #[error("Command '{0}' panicked")]
    Panicked(String),
}

impl CommandError {
    /// Shorthand for [`CommandError::Execution`].
    pub fn execution(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            command: command.into(),
            message: message.into(),
        }
    }

    /// True for the errors that make a set of bindings unusable at startup.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::DuplicateCommand { .. } | Self::InvalidName(_))
    }
}
