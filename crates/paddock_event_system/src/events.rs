//! # Event Model and Handler Abstractions
//!
//! This module defines the closed set of server-originated events that flow
//! through the Paddock event system, the [`EventPayload`] trait that binds each
//! payload type to its [`EventKind`], and the [`EventHandler`] abstraction the
//! bus stores per kind.
//!
//! ## Event Kinds
//!
//! - **Player lifecycle**: [`PlayerJoinEvent`], [`PlayerDisconnectEvent`],
//!   [`PlayerInfoChangedEvent`]
//! - **Chat**: [`PlayerChatEvent`] (ordinary chat only, commands are routed
//!   separately)
//! - **Race progress**: [`WaypointEvent`], [`CheckpointEvent`], [`FinishEvent`]
//! - **Dialogs**: [`DialogAnswerEvent`]
//! - **Host lifecycle**: [`LoadEvent`], [`UnloadEvent`]
//! - **Inter-plugin**: [`CustomEvent`]
//!
//! Events are created once by the translation layer and never mutated. Every
//! variant of [`Event`] holds its payload behind an `Arc`, so all handlers of a
//! dispatch observe the very same instance.

use crate::remote::RemoteError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::future::Future;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Event Kinds
// ============================================================================

/// Tag identifying which event variant, and which handler list, an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// A player joined the server
    Join,
    /// A player left the server
    Disconnect,
    /// A player sent an ordinary chat message
    Chat,
    /// A player crossed a checkpoint
    Checkpoint,
    /// A player finished a run
    Finish,
    /// A player crossed any waypoint (checkpoint, lap end or finish)
    Waypoint,
    /// A player's info changed (nickname, spectator status, flags)
    PlayerInfoChanged,
    /// A player interacted with a dialog
    DialogAnswer,
    /// The host finished loading all plugins
    Load,
    /// The host is shutting down
    Unload,
    /// Event raised by plugins themselves
    Custom,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [EventKind; 11] = [
        EventKind::Join,
        EventKind::Disconnect,
        EventKind::Chat,
        EventKind::Checkpoint,
        EventKind::Finish,
        EventKind::Waypoint,
        EventKind::PlayerInfoChanged,
        EventKind::DialogAnswer,
        EventKind::Load,
        EventKind::Unload,
        EventKind::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Join => "join",
            EventKind::Disconnect => "disconnect",
            EventKind::Chat => "chat",
            EventKind::Checkpoint => "checkpoint",
            EventKind::Finish => "finish",
            EventKind::Waypoint => "waypoint",
            EventKind::PlayerInfoChanged => "player_info_changed",
            EventKind::DialogAnswer => "dialog_answer",
            EventKind::Load => "load",
            EventKind::Unload => "unload",
            EventKind::Custom => "custom",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Event Payloads
// ============================================================================

/// Dispatched when a player joins the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerJoinEvent {
    pub login: String,
    pub is_spectator: bool,
}

/// Dispatched when a player disconnects from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDisconnectEvent {
    pub login: String,
    pub reason: String,
}

/// Dispatched when a player sends a chat message that is not a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerChatEvent {
    pub login: String,
    /// Numeric id the server assigned to the player for this session
    pub player_id: i32,
    pub text: String,
}

/// Race progress reported whenever a player crosses a waypoint.
///
/// Times are in milliseconds, speed in m/s.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WaypointEvent {
    pub login: String,
    pub account_id: String,
    pub speed: f32,
    pub race_time: i32,
    pub lap_time: i32,
    pub checkpoint_in_race: i32,
    pub checkpoint_in_lap: i32,
    pub block_id: String,
    /// Server time when the waypoint was crossed
    pub server_time: i32,
    pub is_end_lap: bool,
    pub is_end_race: bool,
}

/// Dispatched when a player crosses a checkpoint that does not end the race.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckpointEvent(pub WaypointEvent);

impl Deref for CheckpointEvent {
    type Target = WaypointEvent;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Dispatched when a player finishes a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinishEvent(pub WaypointEvent);

impl Deref for FinishEvent {
    type Target = WaypointEvent;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Dispatched when a player's info changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerInfoChangedEvent {
    pub login: String,
    pub nickname: String,
    pub player_id: i32,
    pub team_id: i32,
    pub spectator_status: i32,
    pub flags: i32,
}

/// A single named input value submitted together with a dialog answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogEntry {
    pub name: String,
    pub value: String,
}

/// Dispatched when a player interacts with a dialog.
///
/// `answer` is free-form; dialogs shown through the correlator carry a numeric
/// action id there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogAnswerEvent {
    pub player_id: i32,
    pub login: String,
    pub answer: String,
    #[serde(default)]
    pub entries: Vec<DialogEntry>,
}

/// Dispatched once every plugin has been registered.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadEvent;

/// Dispatched when the host is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UnloadEvent;

/// Custom event dispatched by plugins themselves for inter-plugin communication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CustomEvent {
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            payload,
        }
    }
}

// ============================================================================
// Tagged Union
// ============================================================================

/// A server-originated event, tagged by kind.
#[derive(Debug, Clone)]
pub enum Event {
    Join(Arc<PlayerJoinEvent>),
    Disconnect(Arc<PlayerDisconnectEvent>),
    Chat(Arc<PlayerChatEvent>),
    Checkpoint(Arc<CheckpointEvent>),
    Finish(Arc<FinishEvent>),
    Waypoint(Arc<WaypointEvent>),
    PlayerInfoChanged(Arc<PlayerInfoChangedEvent>),
    DialogAnswer(Arc<DialogAnswerEvent>),
    Load(Arc<LoadEvent>),
    Unload(Arc<UnloadEvent>),
    Custom(Arc<CustomEvent>),
}

impl Event {
    /// Returns the kind tag of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Join(_) => EventKind::Join,
            Event::Disconnect(_) => EventKind::Disconnect,
            Event::Chat(_) => EventKind::Chat,
            Event::Checkpoint(_) => EventKind::Checkpoint,
            Event::Finish(_) => EventKind::Finish,
            Event::Waypoint(_) => EventKind::Waypoint,
            Event::PlayerInfoChanged(_) => EventKind::PlayerInfoChanged,
            Event::DialogAnswer(_) => EventKind::DialogAnswer,
            Event::Load(_) => EventKind::Load,
            Event::Unload(_) => EventKind::Unload,
            Event::Custom(_) => EventKind::Custom,
        }
    }

    /// Wraps a payload into its event variant.
    pub fn new<E: EventPayload>(payload: E) -> Self {
        E::into_event(Arc::new(payload))
    }

    /// Returns the typed payload if this event is of kind `E::KIND`.
    pub fn payload<E: EventPayload>(&self) -> Option<Arc<E>> {
        E::extract(self)
    }
}

/// Binds a payload type to its [`EventKind`] and [`Event`] variant.
///
/// Implemented for every payload in this module; the closed set of kinds means
/// plugins never implement it themselves.
pub trait EventPayload: Send + Sync + Debug + 'static {
    const KIND: EventKind;

    fn extract(event: &Event) -> Option<Arc<Self>>
    where
        Self: Sized;

    fn into_event(payload: Arc<Self>) -> Event
    where
        Self: Sized;
}

macro_rules! impl_event_payload {
    ($($payload:ty => $variant:ident),* $(,)?) => {
        $(
            impl EventPayload for $payload {
                const KIND: EventKind = EventKind::$variant;

                fn extract(event: &Event) -> Option<Arc<Self>> {
                    match event {
                        Event::$variant(payload) => Some(Arc::clone(payload)),
                        _ => None,
                    }
                }

                fn into_event(payload: Arc<Self>) -> Event {
                    Event::$variant(payload)
                }
            }

            impl From<$payload> for Event {
                fn from(payload: $payload) -> Self {
                    Event::$variant(Arc::new(payload))
                }
            }
        )*
    };
}

impl_event_payload! {
    PlayerJoinEvent => Join,
    PlayerDisconnectEvent => Disconnect,
    PlayerChatEvent => Chat,
    CheckpointEvent => Checkpoint,
    FinishEvent => Finish,
    WaypointEvent => Waypoint,
    PlayerInfoChangedEvent => PlayerInfoChanged,
    DialogAnswerEvent => DialogAnswer,
    LoadEvent => Load,
    UnloadEvent => Unload,
    CustomEvent => Custom,
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler trait for processing events asynchronously.
///
/// The bus stores handlers behind this trait, one list per [`EventKind`].
/// Most callers never implement it directly and register typed closures
/// through [`crate::EventSystem::on`], which wraps them in a
/// [`TypedEventHandler`].
///
/// Returns `Ok(true)` when the handler meaningfully acted on the event.
#[async_trait]
pub trait EventHandler: Send + Sync + Debug + 'static {
    async fn handle(&self, event: &Event) -> Result<bool, EventError>;

    /// The kind of event this handler expects.
    fn kind(&self) -> EventKind;

    /// Human-readable name for logging.
    fn handler_name(&self) -> &str;
}

/// Type-safe wrapper bridging a typed async closure to [`EventHandler`].
pub struct TypedEventHandler<E, F> {
    handler: F,
    name: String,
    _phantom: PhantomData<fn(Arc<E>)>,
}

impl<E, F> TypedEventHandler<E, F> {
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: PhantomData,
        }
    }
}

impl<E, F> Debug for TypedEventHandler<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedEventHandler")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<E, F, Fut> EventHandler for TypedEventHandler<E, F>
where
    E: EventPayload,
    F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, EventError>> + Send + 'static,
{
    async fn handle(&self, event: &Event) -> Result<bool, EventError> {
        match E::extract(event) {
            Some(payload) => (self.handler)(payload).await,
            None => Err(EventError::KindMismatch {
                expected: E::KIND,
                actual: event.kind(),
            }),
        }
    }

    fn kind(&self) -> EventKind {
        E::KIND
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A single handler failure collected during a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerFailure {
    pub handler: String,
    pub error: String,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.handler, self.error)
    }
}

/// Errors that can occur during event handling and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Handler execution failed during event processing
    #[error("Handler execution error: {0}")]
    HandlerExecution(String),
    /// A handler received an event of a kind it was not registered for
    #[error("Handler expected a {expected} event but received {actual}")]
    KindMismatch { expected: EventKind, actual: EventKind },
    /// A handler panicked while processing the event
    #[error("Handler {0} panicked")]
    HandlerPanicked(String),
    /// One or more handlers of a dispatch failed; siblings still ran to completion
    #[error("{} of {total} handler(s) failed for {kind} event: {}", failures.len(), join_failures(failures))]
    HandlersFailed {
        kind: EventKind,
        total: usize,
        failures: Vec<HandlerFailure>,
    },
    /// A remote call issued by a handler failed
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
    #[error("An unexpected error occurred: {0}")]
    Other(String),
}

fn join_failures(failures: &[HandlerFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// Tests module
mod tests;
