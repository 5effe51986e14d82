//! Remote-control client speaking newline-delimited JSON over TCP.
//!
//! The bridge is a small protocol proxy sitting next to the game server. Each
//! line we write is a request `{"id", "method", "params"}`; each line we read is
//! either a reply carrying the same `id` (with `result` or `fault`) or a
//! callback `{"method", "params"}` without one.
//!
//! Replies are matched to callers through a map of oneshot senders keyed by
//! request id. A background reader task owns the read half of the socket; when
//! it stops, every outstanding call fails with [`RemoteError::Closed`] and the
//! callback stream ends.
//!
//! The reader never waits on the callback consumer. Callbacks go through an
//! unbounded queue to a forwarding task, so replies keep flowing while the
//! consumer is busy awaiting one of them.

mod frame;

use crate::config::ServerConfig;
use dashmap::DashMap;
use frame::{encode_request, Incoming, IncomingFrame};
use paddock_event_system::{async_trait, RemoteCallback, RemoteClient, RemoteError};
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Capacity of the callback stream handed out by `take_callbacks`.
const CALLBACK_BUFFER: usize = 1024;

type PendingReplies = DashMap<u64, oneshot::Sender<Result<Value, RemoteError>>>;

/// [`RemoteClient`] over a JSON-lines TCP bridge.
pub struct JsonBridgeClient {
    address: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    next_id: AtomicU64,
    pending: Arc<PendingReplies>,
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    callbacks: Mutex<Option<mpsc::Receiver<RemoteCallback>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl JsonBridgeClient {
    pub fn new(address: impl Into<String>, connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
            request_timeout,
            next_id: AtomicU64::new(1),
            pending: Arc::new(DashMap::new()),
            writer: tokio::sync::Mutex::new(None),
            callbacks: Mutex::new(None),
            reader: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.address(),
            Duration::from_millis(config.connect_timeout_ms),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Calls still waiting for their reply.
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    async fn write_line(&self, line: &[u8]) -> Result<(), RemoteError> {
        let mut writer = self.writer.lock().await;
        let stream = writer.as_mut().ok_or(RemoteError::Closed)?;
        stream.write_all(line).await?;
        Ok(())
    }
}

impl fmt::Debug for JsonBridgeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonBridgeClient")
            .field("address", &self.address)
            .field("pending_calls", &self.pending.len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl RemoteClient for JsonBridgeClient {
    async fn connect(&self) -> Result<(), RemoteError> {
        info!("🔌 Connecting to remote bridge at {}", self.address);

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| {
                RemoteError::Connection(format!(
                    "timed out connecting to {} after {}ms",
                    self.address,
                    self.connect_timeout.as_millis()
                ))
            })??;
        stream.set_nodelay(true)?;

        let (read_half, write_half) = stream.into_split();
        let (callback_tx, callback_rx) = mpsc::channel(CALLBACK_BUFFER);

        *self.writer.lock().await = Some(write_half);
        *lock(&self.callbacks) = Some(callback_rx);

        let (queued_tx, queued_rx) = mpsc::unbounded_channel();
        tokio::spawn(forward_callbacks(queued_rx, callback_tx));

        let handle = tokio::spawn(read_loop(read_half, Arc::clone(&self.pending), queued_tx));
        if let Some(previous) = lock(&self.reader).replace(handle) {
            previous.abort();
        }

        info!("✅ Connected to remote bridge at {}", self.address);
        Ok(())
    }

    async fn authenticate(&self, user: &str, password: &str) -> Result<(), RemoteError> {
        match self.call("Authenticate", vec![json!(user), json!(password)]).await {
            Ok(Value::Bool(false)) => Err(RemoteError::Authentication(format!(
                "server refused credentials for {}",
                user
            ))),
            Ok(_) => {
                info!("🔐 Authenticated as {}", user);
                Ok(())
            }
            Err(RemoteError::Fault { message, .. }) => Err(RemoteError::Authentication(message)),
            Err(e) => Err(e),
        }
    }

    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, RemoteError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = encode_request(id, method, &args)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.insert(id, reply_tx);

        trace!("📤 Call #{} {}", id, method);
        if let Err(e) = self.write_line(&line).await {
            self.pending.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(RemoteError::Closed),
            Err(_) => {
                self.pending.remove(&id);
                warn!(
                    "⌛ Call #{} {} got no reply within {}ms",
                    id,
                    method,
                    self.request_timeout.as_millis()
                );
                Err(RemoteError::Connection(format!(
                    "{} timed out after {}ms",
                    method,
                    self.request_timeout.as_millis()
                )))
            }
        }
    }

    fn take_callbacks(&self) -> Option<mpsc::Receiver<RemoteCallback>> {
        lock(&self.callbacks).take()
    }

    async fn disconnect(&self) -> Result<(), RemoteError> {
        if let Some(mut stream) = self.writer.lock().await.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Shutdown of bridge write half failed: {}", e);
            }
        }

        if let Some(handle) = lock(&self.reader).take() {
            handle.abort();
        }
        fail_pending(&self.pending);

        info!("🔌 Disconnected from remote bridge at {}", self.address);
        Ok(())
    }
}

async fn read_loop(
    read_half: OwnedReadHalf,
    pending: Arc<PendingReplies>,
    callbacks: mpsc::UnboundedSender<RemoteCallback>,
) {
    let mut lines = BufReader::new(read_half).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }

                let frame = match serde_json::from_str::<IncomingFrame>(&line) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("⚠️ Dropping malformed bridge frame: {}", e);
                        continue;
                    }
                };

                match frame.classify() {
                    Some(Incoming::Reply { id, result }) => {
                        let Some((_, reply_tx)) = pending.remove(&id) else {
                            debug!("Reply #{} has no waiting caller", id);
                            continue;
                        };
                        let result = result.map_err(|(code, message)| RemoteError::Fault { code, message });
                        // The caller may have timed out in the meantime.
                        let _ = reply_tx.send(result);
                    }
                    Some(Incoming::Callback(callback)) => {
                        if callbacks.send(callback).is_err() {
                            trace!("Callback receiver dropped, discarding callback");
                        }
                    }
                    None => warn!("⚠️ Bridge frame is neither a reply nor a callback"),
                }
            }
            Ok(None) => {
                info!("🔌 Remote bridge closed the connection");
                break;
            }
            Err(e) => {
                error!("❌ Reading from remote bridge failed: {}", e);
                break;
            }
        }
    }

    fail_pending(&pending);
}

/// Moves queued callbacks to the consumer's stream in arrival order.
///
/// Ends once the reader is gone and the queue is drained, which closes the stream.
async fn forward_callbacks(
    mut queued: mpsc::UnboundedReceiver<RemoteCallback>,
    callbacks: mpsc::Sender<RemoteCallback>,
) {
    while let Some(callback) = queued.recv().await {
        if queued.len() > CALLBACK_BUFFER {
            trace!("{} callbacks queued behind a busy consumer", queued.len());
        }
        if callbacks.send(callback).await.is_err() {
            trace!("Callback receiver dropped, discarding queued callbacks");
            break;
        }
    }
}

fn fail_pending(pending: &PendingReplies) {
    let ids: Vec<u64> = pending.iter().map(|entry| *entry.key()).collect();
    for id in ids {
        if let Some((_, reply_tx)) = pending.remove(&id) {
            let _ = reply_tx.send(Err(RemoteError::Closed));
        }
    }
}

#[cfg(test)]
mod tests;
