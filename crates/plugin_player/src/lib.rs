//! # Player Plugin
//!
//! Keeps track of the players on the server and owns chat delivery.
//!
//! ## Overview
//!
//! - **Player cache**: login to nickname, player id and flags, filled on join
//!   and refreshed by `PlayerInfoChanged`
//! - **Chat controller**: with `/chat on` the controller takes over chat
//!   routing and relays each line to every player, as plain text or as
//!   `CHAT_JSON:` objects for players who chose `/chatformat json`
//!
//! Both maps are keyed by login and live only inside this plugin.
//!
//! ## Module Organization
//!
//! - [`player`] - the player cache
//! - [`chat`] - chat formats, the JSON line type and the roster
//! - [`handlers`] - event and command handlers wiring the two to the bus

use paddock_event_system::{
    CommandContext, LoadEvent, Plugin, PluginError, PlayerChatEvent, PlayerDisconnectEvent,
    PlayerInfoChangedEvent, PlayerJoinEvent, Registrar,
};
use std::sync::Arc;
use tracing::info;

// Public modules for external access
pub mod chat;
pub mod handlers;
pub mod player;

use chat::ChatRoster;
use handlers::*;
use player::PlayerCache;

/// The player plugin.
///
/// Cache and roster are shared with every registered handler through `Arc`s
/// and are safe for concurrent access.
pub struct PlayerPlugin {
    /// Human-readable name of the plugin
    name: String,
    players: Arc<PlayerCache>,
    roster: Arc<ChatRoster>,
}

impl PlayerPlugin {
    pub fn new() -> Self {
        Self {
            name: "player".to_string(),
            players: Arc::new(PlayerCache::new()),
            roster: Arc::new(ChatRoster::new()),
        }
    }

    pub fn players(&self) -> Arc<PlayerCache> {
        Arc::clone(&self.players)
    }

    pub fn roster(&self) -> Arc<ChatRoster> {
        Arc::clone(&self.roster)
    }
}

impl Default for PlayerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PlayerPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> Result<(), PluginError> {
        let client = registrar.context().client();

        {
            let (client, players, roster) = (client.clone(), self.players(), self.roster());
            registrar.on(move |_event: Arc<LoadEvent>| {
                let (client, players, roster) = (client.clone(), players.clone(), roster.clone());
                async move { handle_load(client.as_ref(), &players, &roster).await }
            });
        }

        {
            let (client, players, roster) = (client.clone(), self.players(), self.roster());
            registrar.on(move |event: Arc<PlayerJoinEvent>| {
                let (client, players, roster) = (client.clone(), players.clone(), roster.clone());
                async move { handle_player_joined(&event, client.as_ref(), &players, &roster).await }
            });
        }

        {
            let players = self.players();
            registrar.on(move |event: Arc<PlayerInfoChangedEvent>| {
                let handled = handle_player_info_changed(&event, &players);
                async move { Ok(handled) }
            });
        }

        {
            let (players, roster) = (self.players(), self.roster());
            registrar.on(move |event: Arc<PlayerDisconnectEvent>| {
                let handled = handle_player_disconnected(&event, &players, &roster);
                async move { Ok(handled) }
            });
        }

        {
            let (client, players, roster) = (client.clone(), self.players(), self.roster());
            registrar.on(move |event: Arc<PlayerChatEvent>| {
                let (client, players, roster) = (client.clone(), players.clone(), roster.clone());
                async move { handle_chat(&event, client.as_ref(), &players, &roster).await }
            });
        }

        let roster = self.roster();
        registrar.command("chat", &[], move |ctx: CommandContext| {
            let roster = roster.clone();
            async move { chat_command(&ctx, &roster).await }
        })?;

        let roster = self.roster();
        registrar.command("chatformat", &[], move |ctx: CommandContext| {
            let roster = roster.clone();
            async move { chat_format_command(&ctx, &roster).await }
        })?;

        info!("👥 PlayerPlugin: ✅ Player cache and chat controller registered");
        Ok(())
    }
}
