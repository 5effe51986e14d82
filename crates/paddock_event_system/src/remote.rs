//! # Remote-Control Client Interface
//!
//! The game server exposes a remote-control protocol: method calls with
//! positional arguments, faults with a numeric code, and a stream of callbacks
//! pushed by the server. This module defines the [`RemoteClient`] abstraction
//! the rest of Paddock talks to, plus typed helpers for the handful of methods
//! plugins use all the time.
//!
//! Concrete transports live outside this crate; tests use
//! [`crate::testing::RecordingClient`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Debug;
use tokio::sync::mpsc;

/// A callback pushed by the game server: method name plus raw positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCallback {
    pub method: String,
    pub args: Vec<Value>,
}

impl RemoteCallback {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Errors raised by the remote-control connection.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Connection error: {0}")]
    Connection(String),
    /// The server answered the call with a fault
    #[error("Remote fault {code}: {message}")]
    Fault { code: i32, message: String },
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Connection closed")]
    Closed,
}

/// Player information as returned by `GetPlayerInfo` and `GetPlayerList`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerInfo {
    #[serde(rename = "Login")]
    pub login: String,
    #[serde(rename = "NickName")]
    pub nickname: String,
    #[serde(rename = "PlayerId")]
    pub player_id: i32,
    #[serde(rename = "TeamId")]
    pub team_id: i32,
    #[serde(rename = "SpectatorStatus")]
    pub spectator_status: i32,
    #[serde(rename = "LadderRanking")]
    pub ladder_ranking: i32,
    #[serde(rename = "Flags")]
    pub flags: i32,
}

impl PlayerInfo {
    /// Whether the player joined as a spectator.
    pub fn is_spectator(&self) -> bool {
        self.spectator_status % 10 != 0
    }
}

/// Map information as returned by `GetCurrentMapInfo`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapInfo {
    #[serde(rename = "UId")]
    pub uid: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "FileName")]
    pub file_name: String,
    #[serde(rename = "Author")]
    pub author: String,
}

/// Decodes a call result into a typed value.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RemoteError> {
    Ok(serde_json::from_value(value)?)
}

/// Connection to the game server's remote-control interface.
///
/// Implementors provide the transport primitives; the provided methods build
/// the commonly used server calls on top of [`RemoteClient::call`].
#[async_trait]
pub trait RemoteClient: Send + Sync + Debug + 'static {
    async fn connect(&self) -> Result<(), RemoteError>;

    async fn authenticate(&self, user: &str, password: &str) -> Result<(), RemoteError>;

    /// Invokes a remote method and returns its result.
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, RemoteError>;

    /// Hands out the callback stream. Only the first caller receives it.
    fn take_callbacks(&self) -> Option<mpsc::Receiver<RemoteCallback>>;

    async fn disconnect(&self) -> Result<(), RemoteError>;

    /// Displays a dialog page to one player.
    ///
    /// `timeout_ms` of zero keeps the page open until it is answered or replaced.
    async fn send_dialog_to_login(
        &self,
        login: &str,
        body: &str,
        timeout_ms: u32,
        hide_on_click: bool,
    ) -> Result<(), RemoteError> {
        self.call(
            "SendDisplayManialinkPageToLogin",
            vec![json!(login), json!(body), json!(timeout_ms), json!(hide_on_click)],
        )
        .await
        .map(|_| ())
    }

    async fn chat_send_server_message(&self, message: &str) -> Result<(), RemoteError> {
        self.call("ChatSendServerMessage", vec![json!(message)])
            .await
            .map(|_| ())
    }

    async fn chat_send_server_message_to_login(
        &self,
        message: &str,
        login: &str,
    ) -> Result<(), RemoteError> {
        self.call(
            "ChatSendServerMessageToLogin",
            vec![json!(message), json!(login)],
        )
        .await
        .map(|_| ())
    }

    async fn chat_send_server_message_to_id(
        &self,
        message: &str,
        player_id: i32,
    ) -> Result<(), RemoteError> {
        self.call(
            "ChatSendServerMessageToId",
            vec![json!(message), json!(player_id)],
        )
        .await
        .map(|_| ())
    }

    async fn enable_callbacks(&self, enable: bool) -> Result<(), RemoteError> {
        self.call("EnableCallbacks", vec![json!(enable)])
            .await
            .map(|_| ())
    }

    /// Takes over chat routing. While enabled the server no longer relays chat itself.
    async fn chat_enable_manual_routing(
        &self,
        enable: bool,
        auto_forward: bool,
    ) -> Result<(), RemoteError> {
        self.call(
            "ChatEnableManualRouting",
            vec![json!(enable), json!(auto_forward)],
        )
        .await
        .map(|_| ())
    }

    /// Forwards a chat line on behalf of `sender_login`. An empty destination means everyone.
    async fn chat_forward_to_login(
        &self,
        text: &str,
        sender_login: &str,
        dest_login: &str,
    ) -> Result<(), RemoteError> {
        self.call(
            "ChatForwardToLogin",
            vec![json!(text), json!(sender_login), json!(dest_login)],
        )
        .await
        .map(|_| ())
    }

    async fn get_player_info(&self, login: &str) -> Result<PlayerInfo, RemoteError> {
        let value = self
            .call("GetPlayerInfo", vec![json!(login), json!(1)])
            .await?;
        decode(value)
    }

    async fn get_player_list(
        &self,
        max: i32,
        offset: i32,
        compatibility: i32,
    ) -> Result<Vec<PlayerInfo>, RemoteError> {
        let value = self
            .call(
                "GetPlayerList",
                vec![json!(max), json!(offset), json!(compatibility)],
            )
            .await?;
        decode(value)
    }

    async fn get_current_map_info(&self) -> Result<MapInfo, RemoteError> {
        let value = self.call("GetCurrentMapInfo", Vec::new()).await?;
        decode(value)
    }

    async fn kick(&self, login: &str, message: &str) -> Result<(), RemoteError> {
        self.call("Kick", vec![json!(login), json!(message)])
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_info_decodes_server_struct() {
        let value = json!({
            "Login": "alice",
            "NickName": "$f00Alice",
            "PlayerId": 12,
            "TeamId": -1,
            "SpectatorStatus": 0,
            "LadderRanking": 0,
            "Flags": 100
        });

        let info: PlayerInfo = decode(value).expect("decodes");
        assert_eq!(info.login, "alice");
        assert_eq!(info.nickname, "$f00Alice");
        assert_eq!(info.player_id, 12);
        assert!(!info.is_spectator());
    }

    #[test]
    fn test_missing_fields_default() {
        let info: PlayerInfo = decode(json!({"Login": "bob", "SpectatorStatus": 2551})).expect("decodes");
        assert_eq!(info.nickname, "");
        assert!(info.is_spectator());
    }

    #[test]
    fn test_fault_display() {
        let error = RemoteError::Fault {
            code: -1000,
            message: "Login unknown.".to_string(),
        };
        assert_eq!(error.to_string(), "Remote fault -1000: Login unknown.");
    }
}
