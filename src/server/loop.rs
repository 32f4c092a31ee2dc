// Server loop module
// Accepts connections until a shutdown is requested

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// Accept connections on `listener` until `shutdown` is notified.
///
/// Must run inside a `LocalSet`: each connection is served by a local task.
/// Connections still in flight when the loop returns are dropped with the
/// runtime.
pub async fn run_until_shutdown(
    listener: TcpListener,
    state: Arc<config::AppState>,
    shutdown: Arc<Notify>,
) -> Result<(), Box<dyn std::error::Error>> {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                logger::log_info("Shutting down, no longer accepting connections");
                return Ok(());
            }
        }
    }
}
