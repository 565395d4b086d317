//! TCP Listener
//!
//! Accepts connections indefinitely and spawns one session task per client.

use tokio::net::TcpListener;

use super::session;
use crate::startup::AppState;

/// Accept connections until the process exits.
///
/// Only failing to bind is fatal, and that happens before this loop runs.
/// Accept errors and failed sessions are logged and survived.
pub async fn run(listener: TcpListener, state: AppState) {
    loop {
        match listener.accept().await {
            Ok((socket, addr)) => {
                tokio::spawn(session::handle_connection(socket, addr, state.clone()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to accept connection");
            }
        }
    }
}
