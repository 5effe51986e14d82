//! In-memory [`RemoteClient`] for tests.
//!
//! [`RecordingClient`] records every call, answers with canned results, and
//! lets a test push callbacks as if the game server had sent them.
//! [`PluginHarness`] registers a single plugin against a recording client so
//! its handlers and commands can be driven directly.

use crate::commands::{ChatLine, CommandError, CommandRegistry, CommandRouter, RouteOutcome};
use crate::context::ServerContext;
use crate::dialog::{DialogConfig, DialogCorrelator};
use crate::events::{EventError, EventPayload};
use crate::plugin::{Plugin, PluginError, Registrar};
use crate::remote::{RemoteCallback, RemoteClient, RemoteError};
use crate::system::{DispatchReport, EventSystem};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub args: Vec<Value>,
}

impl RecordedCall {
    /// Argument at `index` as a string, if it is one.
    pub fn str_arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
enum CannedReply {
    Value(Value),
    Fault(i32, String),
}

type ReplyKey = (String, Option<String>);

/// Remote client double that never touches the network.
#[derive(Debug)]
pub struct RecordingClient {
    calls: Mutex<Vec<RecordedCall>>,
    replies: Mutex<HashMap<ReplyKey, CannedReply>>,
    callback_tx: Mutex<Option<mpsc::Sender<RemoteCallback>>>,
    callback_rx: Mutex<Option<mpsc::Receiver<RemoteCallback>>>,
    connected: AtomicBool,
    authenticated: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingClient {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(64);
        Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(HashMap::new()),
            callback_tx: Mutex::new(Some(tx)),
            callback_rx: Mutex::new(Some(rx)),
            connected: AtomicBool::new(false),
            authenticated: AtomicBool::new(false),
        }
    }

    /// Answers every call to `method` with `value`.
    pub fn respond_with(&self, method: &str, value: Value) {
        lock(&self.replies).insert((method.to_string(), None), CannedReply::Value(value));
    }

    /// Answers calls to `method` whose first argument is `first_arg` with `value`.
    pub fn respond_to(&self, method: &str, first_arg: &str, value: Value) {
        lock(&self.replies).insert(
            (method.to_string(), Some(first_arg.to_string())),
            CannedReply::Value(value),
        );
    }

    /// Answers every call to `method` with a fault.
    pub fn fail_with(&self, method: &str, code: i32, message: &str) {
        lock(&self.replies).insert(
            (method.to_string(), None),
            CannedReply::Fault(code, message.to_string()),
        );
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Recorded calls to one method, in order.
    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        lock(&self.calls)
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    /// Private messages sent through `ChatSendServerMessageToId`, as (message, player id).
    pub fn messages_to_id(&self) -> Vec<(String, i64)> {
        self.calls_to("ChatSendServerMessageToId")
            .into_iter()
            .map(|call| {
                let message = call.str_arg(0).unwrap_or_default().to_string();
                let id = call.args.get(1).and_then(Value::as_i64).unwrap_or_default();
                (message, id)
            })
            .collect()
    }

    /// Messages broadcast through `ChatSendServerMessage`.
    pub fn broadcasts(&self) -> Vec<String> {
        self.calls_to("ChatSendServerMessage")
            .into_iter()
            .filter_map(|call| call.str_arg(0).map(str::to_string))
            .collect()
    }

    /// Sender for pushing callbacks, until [`RecordingClient::close_callbacks`] is called.
    pub fn callback_sender(&self) -> Option<mpsc::Sender<RemoteCallback>> {
        lock(&self.callback_tx).clone()
    }

    /// Ends the callback stream once every outstanding sender is dropped.
    pub fn close_callbacks(&self) {
        lock(&self.callback_tx).take();
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteClient for RecordingClient {
    async fn connect(&self) -> Result<(), RemoteError> {
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn authenticate(&self, user: &str, _password: &str) -> Result<(), RemoteError> {
        if user.is_empty() {
            return Err(RemoteError::Authentication("empty user".to_string()));
        }
        self.authenticated.store(true, Ordering::Release);
        Ok(())
    }

    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, RemoteError> {
        let first_arg = args.first().and_then(Value::as_str).map(str::to_string);
        lock(&self.calls).push(RecordedCall {
            method: method.to_string(),
            args,
        });

        let reply = {
            let replies = lock(&self.replies);
            replies
                .get(&(method.to_string(), first_arg))
                .or_else(|| replies.get(&(method.to_string(), None)))
                .cloned()
        };

        match reply {
            Some(CannedReply::Value(value)) => Ok(value),
            Some(CannedReply::Fault(code, message)) => Err(RemoteError::Fault { code, message }),
            None => Ok(Value::Bool(true)),
        }
    }

    fn take_callbacks(&self) -> Option<mpsc::Receiver<RemoteCallback>> {
        lock(&self.callback_rx).take()
    }

    async fn disconnect(&self) -> Result<(), RemoteError> {
        self.connected.store(false, Ordering::Release);
        self.close_callbacks();
        Ok(())
    }
}

/// One plugin wired to a [`RecordingClient`], an event bus and a dialog correlator.
#[derive(Debug)]
pub struct PluginHarness {
    pub client: Arc<RecordingClient>,
    pub context: ServerContext,
    router: CommandRouter,
}

impl PluginHarness {
    /// Registers `plugin` and freezes its commands behind a `/` router.
    pub fn new(plugin: &dyn Plugin) -> Result<Self, PluginError> {
        let client = Arc::new(RecordingClient::new());
        let events = Arc::new(EventSystem::new());
        let dialogs = Arc::new(DialogCorrelator::new(client.clone(), DialogConfig::default()));
        dialogs.attach(&events);
        let context = ServerContext::new(client.clone(), events, dialogs);

        let mut registry = CommandRegistry::new();
        let mut registrar = Registrar::new(plugin.name(), &context, &mut registry);
        plugin.register(&mut registrar)?;

        let router = CommandRouter::new(Arc::new(registry), client.clone(), '/');
        Ok(Self {
            client,
            context,
            router,
        })
    }

    pub fn registry(&self) -> &CommandRegistry {
        self.router.registry()
    }

    /// Routes `text` as typed by `login` with session id `player_id`.
    pub async fn chat(&self, player_id: i32, login: &str, text: &str) -> Result<RouteOutcome, CommandError> {
        self.router
            .route(&ChatLine {
                player_id,
                login: login.to_string(),
                text: text.to_string(),
                is_registered_command: false,
            })
            .await
    }

    pub async fn emit<E: EventPayload>(&self, payload: E) -> Result<DispatchReport, EventError> {
        self.context.events().emit(payload).await
    }

    /// Private replies sent to `player_id`, in order.
    pub fn replies_to(&self, player_id: i32) -> Vec<String> {
        self.client
            .messages_to_id()
            .into_iter()
            .filter(|(_, id)| *id == i64::from(player_id))
            .map(|(message, _)| message)
            .collect()
    }
}
