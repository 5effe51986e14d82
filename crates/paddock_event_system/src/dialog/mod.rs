//! # Dialog Answer Correlation
//!
//! Displaying a dialog to a player is fire-and-forget on the wire: the server
//! later reports the player's click as a `DialogAnswer` event carrying an
//! action id. [`DialogCorrelator`] turns that into an awaitable exchange.
//!
//! ```rust,no_run
//! # use paddock_event_system::{DialogCorrelator, DialogError};
//! # use std::sync::Arc;
//! # use std::time::Duration;
//! # async fn rules(dialogs: Arc<DialogCorrelator>) -> Result<(), DialogError> {
//! let accept = dialogs.next_action_id();
//! let decline = dialogs.next_action_id();
//! let body = format!("<manialink>...{accept}...{decline}...</manialink>");
//!
//! match dialogs.ask("alice", &body, &[accept, decline], Duration::from_secs(30)).await {
//!     Ok(id) if id == accept => println!("accepted"),
//!     Ok(_) => println!("declined"),
//!     Err(DialogError::TimedOut) => println!("no answer"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

mod correlator;

pub use correlator::DialogCorrelator;

use crate::remote::RemoteError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

/// Timing knobs for the correlator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Extra time on top of a dialog's own timeout before it counts as expired
    pub grace_ms: u64,
    /// How often the background reaper scans for expired requests
    pub reap_interval_ms: u64,
    /// Timeout used by callers that do not pick their own
    pub default_timeout_ms: u64,
    /// Whether the server hides the page once the player clicks an action
    pub hide_on_click: bool,
}

impl DialogConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_millis(self.reap_interval_ms.max(1))
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            grace_ms: 1_000,
            reap_interval_ms: 1_000,
            default_timeout_ms: 10_000,
            hide_on_click: true,
        }
    }
}

/// Terminal state of a dialog request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    Answered(i32),
    TimedOut,
}

/// Errors surfaced to code waiting on a dialog.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    /// The player did not answer before the deadline
    #[error("Dialog timed out without an answer")]
    TimedOut,
    /// The correlator went away with the request still pending
    #[error("Dialog request was abandoned")]
    Abandoned,
    #[error("A dialog needs at least one action id")]
    NoActions,
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

/// Future returned by [`DialogCorrelator::send`].
///
/// Resolves to the action id the player chose, or [`DialogError::TimedOut`].
#[derive(Debug)]
pub struct PendingAnswer {
    receiver: oneshot::Receiver<DialogOutcome>,
}

impl PendingAnswer {
    pub(crate) fn new(receiver: oneshot::Receiver<DialogOutcome>) -> Self {
        Self { receiver }
    }
}

impl Future for PendingAnswer {
    type Output = Result<i32, DialogError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().receiver).poll(cx) {
            Poll::Ready(Ok(DialogOutcome::Answered(action))) => Poll::Ready(Ok(action)),
            Poll::Ready(Ok(DialogOutcome::TimedOut)) => Poll::Ready(Err(DialogError::TimedOut)),
            Poll::Ready(Err(_)) => Poll::Ready(Err(DialogError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}
