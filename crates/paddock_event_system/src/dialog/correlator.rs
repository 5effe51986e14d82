use super::{DialogConfig, DialogError, DialogOutcome, PendingAnswer};
use crate::events::DialogAnswerEvent;
use crate::remote::RemoteClient;
use crate::shutdown::ShutdownState;
use crate::system::EventSystem;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// Longest timeout the server accepts for a displayed page.
const MAX_TIMEOUT: Duration = Duration::from_millis(u32::MAX as u64);

/// A dialog waiting for its answer.
struct PendingDialog {
    id: u64,
    login: String,
    actions: SmallVec<[i32; 4]>,
    deadline: Instant,
    slot: oneshot::Sender<DialogOutcome>,
}

impl PendingDialog {
    fn resolve(self, outcome: DialogOutcome) {
        // the waiter may have stopped listening
        let _ = self.slot.send(outcome);
    }
}

/// Correlates dialog answers with the requests that displayed them.
///
/// Pending requests live in one list in registration order. The answer path
/// and the reaper both take the same lock, and only for the scan-and-remove
/// step; it is never held across a remote call.
pub struct DialogCorrelator {
    client: Arc<dyn RemoteClient>,
    pending: Mutex<Vec<PendingDialog>>,
    next_action: AtomicI32,
    next_request: AtomicU64,
    config: DialogConfig,
}

impl std::fmt::Debug for DialogCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogCorrelator")
            .field("next_action", &self.next_action.load(Ordering::Relaxed))
            .field("config", &self.config)
            .finish()
    }
}

impl DialogCorrelator {
    pub fn new(client: Arc<dyn RemoteClient>, config: DialogConfig) -> Self {
        Self {
            client,
            pending: Mutex::new(Vec::new()),
            next_action: AtomicI32::new(0),
            next_request: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &DialogConfig {
        &self.config
    }

    /// Mints a process-unique action id.
    pub fn next_action_id(&self) -> i32 {
        self.next_action.fetch_add(1, Ordering::Relaxed)
    }

    /// Displays `body` to `login` and returns a future for the player's choice.
    ///
    /// Timeouts longer than `u32::MAX` milliseconds are clamped to it.
    ///
    /// The request is registered before the display call goes out so that an
    /// immediate answer cannot slip past it. If the display call fails the
    /// request is withdrawn and the error returned.
    pub async fn send(
        &self,
        login: &str,
        body: &str,
        actions: &[i32],
        timeout: Duration,
    ) -> Result<PendingAnswer, DialogError> {
        if actions.is_empty() {
            return Err(DialogError::NoActions);
        }

        let (slot, receiver) = oneshot::channel();
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let timeout = timeout.min(MAX_TIMEOUT);
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout.saturating_add(self.config.grace()))
            .unwrap_or(now + MAX_TIMEOUT);

        self.pending.lock().await.push(PendingDialog {
            id,
            login: login.to_string(),
            actions: SmallVec::from_slice(actions),
            deadline,
            slot,
        });

        let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        if let Err(e) = self
            .client
            .send_dialog_to_login(login, body, timeout_ms, self.config.hide_on_click)
            .await
        {
            warn!("⚠️ Failed to display dialog to {}: {}", login, e);
            self.pending.lock().await.retain(|request| request.id != id);
            return Err(e.into());
        }

        debug!("💬 Dialog shown to {} awaiting one of {:?}", login, actions);
        Ok(PendingAnswer::new(receiver))
    }

    /// Sends a dialog and waits for the answer.
    ///
    /// Never await this directly inside an event handler. The answer is
    /// delivered by a later dispatch, which cannot start until the handler
    /// returns, so the call would only end by timing out. Command handlers
    /// already run in their own task.
    pub async fn ask(
        &self,
        login: &str,
        body: &str,
        actions: &[i32],
        timeout: Duration,
    ) -> Result<i32, DialogError> {
        self.send(login, body, actions, timeout).await?.await
    }

    /// Handles a dialog answer. Returns true when it resolved a pending request.
    ///
    /// Non-numeric answers are ignored. If the oldest pending request has
    /// expired it is timed out instead and the answer is not consumed.
    pub async fn on_answer(&self, answer: &DialogAnswerEvent) -> bool {
        let Ok(action) = answer.answer.trim().parse::<i32>() else {
            trace!("Ignoring non-numeric dialog answer from {}", answer.login);
            return false;
        };

        let resolved = {
            let mut pending = self.pending.lock().await;

            if pending
                .first()
                .is_some_and(|request| request.deadline <= Instant::now())
            {
                let expired = pending.remove(0);
                debug!("⌛ Dialog for {} expired before answer {}", expired.login, action);
                expired.resolve(DialogOutcome::TimedOut);
                return false;
            }

            let index = pending
                .iter()
                .position(|request| request.actions.contains(&action));
            index.map(|index| pending.remove(index))
        };

        match resolved {
            Some(request) => {
                debug!("✅ {} answered dialog with action {}", request.login, action);
                request.resolve(DialogOutcome::Answered(action));
                true
            }
            None => {
                trace!("No pending dialog accepts action {} from {}", action, answer.login);
                false
            }
        }
    }

    /// Times out and removes every expired request. Returns how many were reaped.
    pub async fn reap_expired(&self) -> usize {
        let now = Instant::now();
        let expired = {
            let mut pending = self.pending.lock().await;
            let (expired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut *pending)
                .into_iter()
                .partition(|request| request.deadline <= now);
            *pending = live;
            expired
        };

        let count = expired.len();
        for request in expired {
            debug!("⌛ Dialog for {} timed out", request.login);
            request.resolve(DialogOutcome::TimedOut);
        }
        count
    }

    /// Number of requests still waiting.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Starts the background reaper.
    ///
    /// The task stops at its next wake-up once shutdown has been initiated or
    /// the correlator has been dropped. Requests still pending at that point
    /// stay unresolved.
    pub fn spawn_reaper(self: &Arc<Self>, shutdown: ShutdownState) -> JoinHandle<()> {
        let correlator = Arc::downgrade(self);
        let interval = self.config.reap_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if shutdown.is_shutdown_initiated() {
                    debug!("🧹 Dialog reaper stopping for shutdown");
                    break;
                }

                let Some(correlator) = correlator.upgrade() else {
                    break;
                };

                let reaped = correlator.reap_expired().await;
                if reaped > 0 {
                    debug!("🧹 Reaped {} expired dialog(s)", reaped);
                }
            }
        })
    }

    /// Registers the answer handler on the event bus.
    pub fn attach(self: &Arc<Self>, events: &EventSystem) {
        let correlator = Arc::clone(self);
        events.on("dialogs", move |event: Arc<DialogAnswerEvent>| {
            let correlator = Arc::clone(&correlator);
            async move { Ok(correlator.on_answer(&event).await) }
        });
        info!("💬 Dialog correlator attached to the event bus");
    }
}
