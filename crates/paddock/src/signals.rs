//! Signal handling for graceful controller shutdown.
//!
//! The first SIGINT/SIGTERM (Ctrl+C on Windows) initiates a graceful
//! shutdown; a second one exits the process immediately.

use paddock_event_system::ShutdownState;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Resolves when a termination signal is received.
pub async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => (),
            _ = sigterm.recv() => ()
        }
    }

    #[cfg(windows)]
    signal::ctrl_c().await?;

    Ok(())
}

/// Spawns the task that turns signals into shutdown requests on `shutdown`.
pub fn spawn_signal_handler(shutdown: ShutdownState) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            error!("❌ Failed to listen for shutdown signals: {}", e);
            return;
        }

        info!("📡 Received shutdown signal - initiating graceful shutdown");
        shutdown.initiate_shutdown();

        // merciless shutdown
        if let Err(e) = wait_for_signal().await {
            error!("❌ Failed to set up merciless shutdown signal handler: {}", e);
            return;
        }

        warn!("⚠️ Shutdown signal received again, exiting now");
        std::process::exit(1);
    })
}
