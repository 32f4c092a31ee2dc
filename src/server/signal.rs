// Signal handling module
//
// Supported signals:
// - SIGTERM: Shutdown
// - SIGINT:  Shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Signal handler state
pub struct SignalHandler {
    /// Shutdown signal (SIGTERM, SIGINT)
    pub shutdown: Arc<Notify>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Wake the accept loop so it stops
    pub fn request_shutdown(&self, signal: &str) {
        logger::log_shutdown(signal);
        // notify_one keeps a permit if the loop is not waiting right now
        self.shutdown.notify_one();
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Start signal handlers (Unix)
///
/// | Signal  | Action           |
/// |---------|------------------|
/// | SIGTERM | Stop the server  |
/// | SIGINT  | Stop the server  |
#[cfg(unix)]
pub fn start_signal_handler(handler: Arc<SignalHandler>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    logger::log_error(&format!("Failed to register signal handlers: {e}"));
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => handler.request_shutdown("SIGTERM"),
            _ = sigint.recv() => handler.request_shutdown("SIGINT (Ctrl+C)"),
        }
    });
}

/// Non-Unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(handler: Arc<SignalHandler>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => handler.request_shutdown("Ctrl+C"),
            Err(e) => logger::log_error(&format!("Failed to listen for Ctrl+C: {e}")),
        }
    });
}
