//! Routing of translated callbacks to the event system and command router.

use super::translate::{translate, Translated};
use crate::error::ServerError;
use paddock_event_system::{
    ChatLine, CommandRouter, EventSystem, PlayerChatEvent, RemoteCallback, RouteOutcome,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// What happened to one callback.
#[derive(Debug)]
pub enum Routed {
    /// Events were dispatched; the count says how many
    Dispatched(usize),
    /// A command invocation was spawned
    Command(JoinHandle<()>),
    Ignored,
}

/// Feeds server callbacks into the rest of the controller.
///
/// Events are dispatched one after another and awaited, so handlers observe
/// them in the order the server sent them. Command lines run on their own task
/// so a command awaiting a dialog answer does not block the callback that
/// carries that answer.
#[derive(Debug, Clone)]
pub struct CallbackRouter {
    events: Arc<EventSystem>,
    commands: CommandRouter,
}

impl CallbackRouter {
    pub fn new(events: Arc<EventSystem>, commands: CommandRouter) -> Self {
        Self { events, commands }
    }

    pub fn commands(&self) -> &CommandRouter {
        &self.commands
    }

    /// Routes one callback.
    ///
    /// Handler failures are logged by the event system and do not fail routing;
    /// only callbacks that cannot be translated return an error.
    pub async fn route(&self, callback: &RemoteCallback) -> Result<Routed, ServerError> {
        match translate(callback)? {
            Translated::Events(events) => {
                let count = events.len();
                for event in events {
                    let kind = event.kind();
                    if let Err(e) = self.events.dispatch(event).await {
                        warn!("⚠️ Dispatch of {} event finished with errors: {}", kind, e);
                    }
                }
                Ok(Routed::Dispatched(count))
            }
            Translated::Chat(line) => self.route_chat(line).await,
            Translated::Ignored => {
                trace!("⏭️ Ignoring callback {}", callback.method);
                Ok(Routed::Ignored)
            }
        }
    }

    async fn route_chat(&self, line: ChatLine) -> Result<Routed, ServerError> {
        // Player id 0 is the server itself.
        if line.player_id == 0 {
            return Ok(Routed::Ignored);
        }

        if self.commands.is_command(&line) {
            let router = self.commands.clone();
            let handle = tokio::spawn(async move {
                match router.route(&line).await {
                    Ok(RouteOutcome::Executed { .. }) | Ok(RouteOutcome::Unknown(_)) => {}
                    Ok(RouteOutcome::NotACommand) => {
                        debug!("💬 Line from {} was not a command after all", line.login);
                    }
                    Err(e) => warn!("⚠️ Command line from {} not completed: {}", line.login, e),
                }
            });
            return Ok(Routed::Command(handle));
        }

        let chat = PlayerChatEvent {
            login: line.login,
            player_id: line.player_id,
            text: line.text,
        };
        if let Err(e) = self.events.emit(chat).await {
            warn!("⚠️ Dispatch of chat event finished with errors: {}", e);
        }
        Ok(Routed::Dispatched(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::translate::{MODE_SCRIPT_CALLBACK, PLAYER_CHAT, PLAYER_CONNECT, WAYPOINT_CALLBACK};
    use paddock_event_system::testing::RecordingClient;
    use paddock_event_system::{
        CheckpointEvent, CommandContext, CommandRegistry, RemoteClient, WaypointEvent,
    };
    use serde_json::json;
    use std::sync::Mutex;

    fn router_with(registry: CommandRegistry) -> (CallbackRouter, Arc<EventSystem>, Arc<RecordingClient>) {
        let client = Arc::new(RecordingClient::new());
        let events = Arc::new(EventSystem::new());
        let commands = CommandRouter::new(
            Arc::new(registry),
            client.clone() as Arc<dyn RemoteClient>,
            '/',
        );
        (CallbackRouter::new(events.clone(), commands), events, client)
    }

    fn chat(player_id: i32, text: &str) -> RemoteCallback {
        RemoteCallback::new(
            PLAYER_CHAT,
            vec![json!(player_id), json!("alice"), json!(text), json!(false)],
        )
    }

    #[tokio::test]
    async fn test_plain_chat_is_dispatched_as_event() {
        let (router, events, _client) = router_with(CommandRegistry::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        events.on("test", move |event: Arc<PlayerChatEvent>| {
            let sink = sink.clone();
            async move {
                sink.lock().expect("lock").push(event.text.clone());
                Ok(true)
            }
        });

        let routed = router.route(&chat(4, "hello")).await.expect("routes");
        assert!(matches!(routed, Routed::Dispatched(1)));
        assert_eq!(*seen.lock().expect("lock"), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_server_messages_are_ignored() {
        let (router, events, _client) = router_with(CommandRegistry::new());
        let routed = router.route(&chat(0, "/ping")).await.expect("routes");
        assert!(matches!(routed, Routed::Ignored));
        assert_eq!(events.get_stats().events_dispatched, 0);
    }

    #[tokio::test]
    async fn test_command_lines_run_on_their_own_task() {
        let mut registry = CommandRegistry::new();
        registry
            .bind("ping", &["p"], "test", |ctx: CommandContext| async move {
                ctx.reply("Pong").await
            })
            .expect("bind");
        let (router, events, client) = router_with(registry);

        let routed = router.route(&chat(4, "/p")).await.expect("routes");
        let Routed::Command(handle) = routed else {
            panic!("expected spawned command");
        };
        handle.await.expect("command task");

        assert_eq!(client.messages_to_id(), vec![("Pong".to_string(), 4)]);
        assert_eq!(events.get_stats().events_dispatched, 0);
    }

    #[tokio::test]
    async fn test_unknown_command_replies_privately() {
        let (router, _events, client) = router_with(CommandRegistry::new());

        let Routed::Command(handle) = router.route(&chat(6, "/nope")).await.expect("routes") else {
            panic!("expected spawned command");
        };
        handle.await.expect("command task");

        assert_eq!(
            client.messages_to_id(),
            vec![("Unknown command 'nope'".to_string(), 6)]
        );
    }

    #[tokio::test]
    async fn test_waypoint_events_dispatch_in_order() {
        let (router, events, _client) = router_with(CommandRegistry::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let sink = order.clone();
        events.on("test", move |_event: Arc<WaypointEvent>| {
            let sink = sink.clone();
            async move {
                sink.lock().expect("lock").push("waypoint");
                Ok(true)
            }
        });
        let sink = order.clone();
        events.on("test", move |_event: Arc<CheckpointEvent>| {
            let sink = sink.clone();
            async move {
                sink.lock().expect("lock").push("checkpoint");
                Ok(true)
            }
        });

        let payload = json!({"login": "alice", "racetime": 1200, "isendrace": false}).to_string();
        let callback = RemoteCallback::new(
            MODE_SCRIPT_CALLBACK,
            vec![json!(WAYPOINT_CALLBACK), json!([payload])],
        );

        let routed = router.route(&callback).await.expect("routes");
        assert!(matches!(routed, Routed::Dispatched(2)));
        assert_eq!(*order.lock().expect("lock"), vec!["waypoint", "checkpoint"]);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_fail_routing() {
        let (router, events, _client) = router_with(CommandRegistry::new());
        events.on("test", |_event: Arc<paddock_event_system::PlayerJoinEvent>| async move {
            Err(paddock_event_system::EventError::HandlerExecution("boom".to_string()))
        });

        let callback = RemoteCallback::new(PLAYER_CONNECT, vec![json!("bob"), json!(false)]);
        let routed = router.route(&callback).await.expect("routes");
        assert!(matches!(routed, Routed::Dispatched(1)));
        assert_eq!(events.get_stats().handler_failures, 1);
    }

    #[tokio::test]
    async fn test_malformed_callback_is_an_error() {
        let (router, _events, _client) = router_with(CommandRegistry::new());
        let callback = RemoteCallback::new(PLAYER_CONNECT, vec![]);
        assert!(matches!(
            router.route(&callback).await,
            Err(ServerError::Protocol { .. })
        ));
    }
}
