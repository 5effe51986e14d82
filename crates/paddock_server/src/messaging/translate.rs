//! Translation of raw server callbacks into typed events.
//!
//! The game server pushes callbacks as a method name plus positional
//! arguments. This module maps the ones the controller cares about onto
//! [`Event`]s (or a [`ChatLine`] for the command router) and ignores the rest.

use crate::error::ServerError;
use paddock_event_system::{
    ChatLine, CheckpointEvent, DialogAnswerEvent, DialogEntry, Event, FinishEvent, PlayerInfo,
    PlayerDisconnectEvent, PlayerInfoChangedEvent, PlayerJoinEvent, RemoteCallback, WaypointEvent,
};
use serde::Deserialize;
use serde_json::Value;
use smallvec::{smallvec, SmallVec};

pub const PLAYER_CONNECT: &str = "ManiaPlanet.PlayerConnect";
pub const PLAYER_DISCONNECT: &str = "ManiaPlanet.PlayerDisconnect";
pub const PLAYER_CHAT: &str = "ManiaPlanet.PlayerChat";
pub const PLAYER_DIALOG_ANSWER: &str = "ManiaPlanet.PlayerManialinkPageAnswer";
pub const PLAYER_INFO_CHANGED: &str = "ManiaPlanet.PlayerInfoChanged";
pub const MODE_SCRIPT_CALLBACK: &str = "ManiaPlanet.ModeScriptCallbackArray";
pub const WAYPOINT_CALLBACK: &str = "Trackmania.Event.WayPoint";

/// Result of translating one callback.
#[derive(Debug)]
pub enum Translated {
    /// Events to dispatch, in order
    Events(SmallVec<[Event; 2]>),
    /// A chat line for the command router or the chat event path
    Chat(ChatLine),
    /// Callback the controller does not handle
    Ignored,
}

/// Waypoint payload as sent by the game mode script.
#[derive(Debug, Deserialize)]
struct ModeScriptWaypoint {
    #[serde(default)]
    time: i32,
    login: String,
    #[serde(default)]
    accountid: String,
    #[serde(default)]
    racetime: i32,
    #[serde(default)]
    laptime: i32,
    #[serde(default)]
    checkpointinrace: i32,
    #[serde(default)]
    checkpointinlap: i32,
    #[serde(default)]
    isendrace: bool,
    #[serde(default)]
    isendlap: bool,
    #[serde(default)]
    blockid: String,
    #[serde(default)]
    speed: f32,
}

impl From<ModeScriptWaypoint> for WaypointEvent {
    fn from(raw: ModeScriptWaypoint) -> Self {
        Self {
            login: raw.login,
            account_id: raw.accountid,
            speed: raw.speed,
            race_time: raw.racetime,
            lap_time: raw.laptime,
            checkpoint_in_race: raw.checkpointinrace,
            checkpoint_in_lap: raw.checkpointinlap,
            block_id: raw.blockid,
            server_time: raw.time,
            is_end_lap: raw.isendlap,
            is_end_race: raw.isendrace,
        }
    }
}

/// Translates one callback.
pub fn translate(callback: &RemoteCallback) -> Result<Translated, ServerError> {
    let method = callback.method.as_str();
    let args = &callback.args;

    let translated = match method {
        PLAYER_CONNECT => single(PlayerJoinEvent {
            login: arg_str(method, args, 0)?,
            is_spectator: arg_bool(method, args, 1)?,
        }),
        PLAYER_DISCONNECT => single(PlayerDisconnectEvent {
            login: arg_str(method, args, 0)?,
            reason: arg_str(method, args, 1).unwrap_or_default(),
        }),
        PLAYER_CHAT => Translated::Chat(ChatLine {
            player_id: arg_i32(method, args, 0)?,
            login: arg_str(method, args, 1)?,
            text: arg_str(method, args, 2)?,
            is_registered_command: arg_bool(method, args, 3).unwrap_or(false),
        }),
        PLAYER_DIALOG_ANSWER => single(DialogAnswerEvent {
            player_id: arg_i32(method, args, 0)?,
            login: arg_str(method, args, 1)?,
            answer: arg_str(method, args, 2)?,
            entries: entries(method, args.get(3))?,
        }),
        PLAYER_INFO_CHANGED => {
            let info: PlayerInfo = decode(method, arg(method, args, 0)?)?;
            single(PlayerInfoChangedEvent {
                login: info.login,
                nickname: info.nickname,
                player_id: info.player_id,
                team_id: info.team_id,
                spectator_status: info.spectator_status,
                flags: info.flags,
            })
        }
        MODE_SCRIPT_CALLBACK => mode_script(method, args)?,
        _ => Translated::Ignored,
    };

    Ok(translated)
}

fn mode_script(method: &str, args: &[Value]) -> Result<Translated, ServerError> {
    let name = arg_str(method, args, 0)?;
    if name != WAYPOINT_CALLBACK {
        return Ok(Translated::Ignored);
    }

    let payload = arg(method, args, 1)?
        .as_array()
        .and_then(|values| values.first())
        .and_then(Value::as_str)
        .ok_or_else(|| ServerError::protocol(method, "waypoint callback without JSON payload"))?;

    let raw: ModeScriptWaypoint = serde_json::from_str(payload)
        .map_err(|e| ServerError::protocol(method, format!("invalid waypoint payload: {}", e)))?;
    let waypoint = WaypointEvent::from(raw);

    let follow_up = if waypoint.is_end_race {
        Event::new(FinishEvent(waypoint.clone()))
    } else {
        Event::new(CheckpointEvent(waypoint.clone()))
    };

    Ok(Translated::Events(smallvec![Event::new(waypoint), follow_up]))
}

fn single(event: impl Into<Event>) -> Translated {
    Translated::Events(smallvec![event.into()])
}

fn arg<'a>(method: &str, args: &'a [Value], index: usize) -> Result<&'a Value, ServerError> {
    args.get(index)
        .ok_or_else(|| ServerError::protocol(method, format!("missing argument {}", index)))
}

fn arg_str(method: &str, args: &[Value], index: usize) -> Result<String, ServerError> {
    arg(method, args, index)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ServerError::protocol(method, format!("argument {} is not a string", index)))
}

fn arg_bool(method: &str, args: &[Value], index: usize) -> Result<bool, ServerError> {
    arg(method, args, index)?
        .as_bool()
        .ok_or_else(|| ServerError::protocol(method, format!("argument {} is not a boolean", index)))
}

fn arg_i32(method: &str, args: &[Value], index: usize) -> Result<i32, ServerError> {
    arg(method, args, index)?
        .as_i64()
        .and_then(|value| i32::try_from(value).ok())
        .ok_or_else(|| ServerError::protocol(method, format!("argument {} is not an integer", index)))
}

fn decode<T: for<'de> Deserialize<'de>>(method: &str, value: &Value) -> Result<T, ServerError> {
    T::deserialize(value).map_err(|e| ServerError::protocol(method, e.to_string()))
}

fn entries(method: &str, value: Option<&Value>) -> Result<Vec<DialogEntry>, ServerError> {
    #[derive(Deserialize)]
    struct RawEntry {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Value")]
        value: String,
    }

    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            let raw: Vec<RawEntry> = decode(method, value)?;
            Ok(raw
                .into_iter()
                .map(|entry| DialogEntry {
                    name: entry.name,
                    value: entry.value,
                })
                .collect())
        }
    }
}
