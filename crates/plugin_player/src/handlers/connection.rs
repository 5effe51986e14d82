//! # Player Connection Handler
//!
//! Keeps the player cache and the chat roster in step with who is on the
//! server.
//!
//! ## Connection Flow
//!
//! 1. `Load`: fetch the current player list so players already connected
//!    before the controller started are known
//! 2. `Join`: fetch `GetPlayerInfo` for the login and cache it
//! 3. `PlayerInfoChanged`: refresh or create the cache entry
//! 4. `Disconnect`: forget the login everywhere

use crate::chat::ChatRoster;
use crate::player::{CachedPlayer, PlayerCache};
use paddock_event_system::{
    EventError, PlayerDisconnectEvent, PlayerInfoChangedEvent, PlayerJoinEvent, RemoteClient,
};
use tracing::{debug, info};

/// Seeds cache and roster from `GetPlayerList` once plugins are loaded.
pub async fn handle_load(
    client: &dyn RemoteClient,
    cache: &PlayerCache,
    roster: &ChatRoster,
) -> Result<bool, EventError> {
    let players = client.get_player_list(-1, 0, 1).await?;
    for player in players {
        roster.join(&player.login);
        cache.upsert(CachedPlayer::from(player));
    }

    info!("👥 Player cache seeded with {} player(s)", cache.len());
    Ok(!cache.is_empty())
}

pub async fn handle_player_joined(
    event: &PlayerJoinEvent,
    client: &dyn RemoteClient,
    cache: &PlayerCache,
    roster: &ChatRoster,
) -> Result<bool, EventError> {
    roster.join(&event.login);

    let info = client.get_player_info(&event.login).await?;
    debug!("👥 Caching {} as '{}'", event.login, info.nickname);
    cache.upsert(CachedPlayer::from(info));
    Ok(true)
}

pub fn handle_player_info_changed(event: &PlayerInfoChangedEvent, cache: &PlayerCache) -> bool {
    cache.apply(event);
    true
}

pub fn handle_player_disconnected(
    event: &PlayerDisconnectEvent,
    cache: &PlayerCache,
    roster: &ChatRoster,
) -> bool {
    roster.leave(&event.login);
    let known = cache.remove(&event.login).is_some();
    debug!("👥 {} left ({}), cached: {}", event.login, event.reason, known);
    known
}
