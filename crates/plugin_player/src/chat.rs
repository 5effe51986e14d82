//! # Chat Roster
//!
//! Tracks how each connected player wants chat delivered and whether the
//! controller has taken over chat routing from the server.
//!
//! Players on the [`ChatFormat::Json`] format receive every line as
//! `CHAT_JSON:` followed by a [`ChatJson`] object, which chat-aware clients
//! render themselves. Everyone else gets plain text.

use dashmap::DashMap;
use paddock_event_system::{RemoteClient, RemoteError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

/// Prefix marking a structured chat line.
pub const CHAT_JSON_PREFIX: &str = "CHAT_JSON:";

/// How a player receives chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ChatFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ChatFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Structured chat line for [`ChatFormat::Json`] receivers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clubtag: Option<String>,
    pub text: String,
}

impl ChatJson {
    /// The line as sent to JSON receivers.
    pub fn to_line(&self) -> Result<String, RemoteError> {
        Ok(format!("{}{}", CHAT_JSON_PREFIX, serde_json::to_string(self)?))
    }
}

/// Per-login chat formats plus the manual routing switch.
#[derive(Debug, Default)]
pub struct ChatRoster {
    formats: DashMap<String, ChatFormat>,
    routing: AtomicBool,
}

impl ChatRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `login` with the text format unless it is already known.
    pub fn join(&self, login: &str) {
        self.formats.entry(login.to_string()).or_default();
    }

    pub fn leave(&self, login: &str) {
        self.formats.remove(login);
    }

    /// Sets the format for `login`. Returns false if it was already in effect.
    pub fn set_format(&self, login: &str, format: ChatFormat) -> bool {
        let previous = self.formats.insert(login.to_string(), format);
        previous != Some(format)
    }

    pub fn format_of(&self, login: &str) -> Option<ChatFormat> {
        self.formats.get(login).map(|entry| *entry.value())
    }

    /// Sorted logins currently receiving `format`.
    pub fn logins_with(&self, format: ChatFormat) -> Vec<String> {
        let mut logins: Vec<String> = self
            .formats
            .iter()
            .filter(|entry| *entry.value() == format)
            .map(|entry| entry.key().clone())
            .collect();
        logins.sort();
        logins
    }

    pub fn is_routing(&self) -> bool {
        self.routing.load(Ordering::Acquire)
    }

    pub fn set_routing(&self, enabled: bool) {
        self.routing.store(enabled, Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Delivers `message` to every known player in their format.
    ///
    /// `text_line` is what plain-text receivers see.
    pub async fn deliver(
        &self,
        client: &dyn RemoteClient,
        message: &ChatJson,
        text_line: &str,
    ) -> Result<(), RemoteError> {
        let json_logins = self.logins_with(ChatFormat::Json);
        if !json_logins.is_empty() {
            client
                .chat_send_server_message_to_login(&message.to_line()?, &json_logins.join(","))
                .await?;
        }

        let text_logins = self.logins_with(ChatFormat::Text);
        if !text_logins.is_empty() {
            client
                .chat_send_server_message_to_login(text_line, &text_logins.join(","))
                .await?;
        }

        Ok(())
    }

    /// Sends a server message to one player in their format.
    ///
    /// Unknown logins receive nothing.
    pub async fn send_to_login(
        &self,
        client: &dyn RemoteClient,
        login: &str,
        message: &str,
    ) -> Result<(), RemoteError> {
        let text = message.trim();
        match self.format_of(login) {
            Some(ChatFormat::Json) => {
                let line = ChatJson {
                    text: text.to_string(),
                    ..ChatJson::default()
                }
                .to_line()?;
                client.chat_send_server_message_to_login(&line, login).await
            }
            Some(ChatFormat::Text) => client.chat_send_server_message_to_login(text, login).await,
            None => Ok(()),
        }
    }
}
