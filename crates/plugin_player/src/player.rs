//! # Player Cache
//!
//! Per-login snapshot of what the server last told us about each connected
//! player. Filled on join through `GetPlayerInfo`, refreshed by
//! `PlayerInfoChanged` callbacks and dropped on disconnect.

use dashmap::DashMap;
use paddock_event_system::{PlayerInfo, PlayerInfoChangedEvent};
use serde::{Deserialize, Serialize};

/// What the controller knows about one connected player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CachedPlayer {
    pub login: String,
    pub nickname: String,
    pub player_id: i32,
    pub spectator_status: i32,
    pub flags: i32,
}

impl CachedPlayer {
    pub fn is_spectator(&self) -> bool {
        self.spectator_status % 10 != 0
    }
}

impl From<PlayerInfo> for CachedPlayer {
    fn from(info: PlayerInfo) -> Self {
        Self {
            login: info.login,
            nickname: info.nickname,
            player_id: info.player_id,
            spectator_status: info.spectator_status,
            flags: info.flags,
        }
    }
}

impl From<&PlayerInfoChangedEvent> for CachedPlayer {
    fn from(event: &PlayerInfoChangedEvent) -> Self {
        Self {
            login: event.login.clone(),
            nickname: event.nickname.clone(),
            player_id: event.player_id,
            spectator_status: event.spectator_status,
            flags: event.flags,
        }
    }
}

/// Thread-safe map from login to [`CachedPlayer`].
#[derive(Debug, Default)]
pub struct PlayerCache {
    players: DashMap<String, CachedPlayer>,
}

impl PlayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `player.login`.
    pub fn upsert(&self, player: CachedPlayer) {
        self.players.insert(player.login.clone(), player);
    }

    /// Applies an info change, creating the entry if the player is unknown.
    pub fn apply(&self, event: &PlayerInfoChangedEvent) {
        self.players
            .entry(event.login.clone())
            .and_modify(|cached| {
                cached.nickname = event.nickname.clone();
                cached.player_id = event.player_id;
                cached.spectator_status = event.spectator_status;
                cached.flags = event.flags;
            })
            .or_insert_with(|| CachedPlayer::from(event));
    }

    pub fn remove(&self, login: &str) -> Option<CachedPlayer> {
        self.players.remove(login).map(|(_, player)| player)
    }

    pub fn get(&self, login: &str) -> Option<CachedPlayer> {
        self.players.get(login).map(|entry| entry.value().clone())
    }

    pub fn nickname(&self, login: &str) -> Option<String> {
        self.players.get(login).map(|entry| entry.nickname.clone())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(login: &str, nickname: &str, spectator_status: i32) -> PlayerInfoChangedEvent {
        PlayerInfoChangedEvent {
            login: login.to_string(),
            nickname: nickname.to_string(),
            player_id: 4,
            team_id: 0,
            spectator_status,
            flags: 0,
        }
    }

    #[test]
    fn test_apply_creates_then_updates() {
        let cache = PlayerCache::new();
        cache.apply(&changed("alice", "Alice", 0));
        assert_eq!(cache.nickname("alice").as_deref(), Some("Alice"));

        cache.apply(&changed("alice", "$0f0Alice", 2551));
        let cached = cache.get("alice").expect("cached");
        assert_eq!(cached.nickname, "$0f0Alice");
        assert!(cached.is_spectator());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_forgets_player() {
        let cache = PlayerCache::new();
        cache.upsert(CachedPlayer {
            login: "bob".to_string(),
            ..CachedPlayer::default()
        });
        assert!(cache.remove("bob").is_some());
        assert!(cache.remove("bob").is_none());
        assert!(cache.is_empty());
    }
}
