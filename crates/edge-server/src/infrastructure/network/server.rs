//! Control-channel accept loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{error, info};

use crate::infrastructure::network::supervisor::supervise;
use crate::state::ServerState;

/// How often the accept loop rechecks the shutdown flag when idle.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Accepts connections on `listener` until `running` is cleared.
///
/// Each accepted connection is handed to its own Tokio task, so one slow or
/// blocked client never delays the others or the accept loop.
pub async fn run_server(listener: TcpListener, state: Arc<ServerState>, running: Arc<AtomicBool>) {
    if let Ok(addr) = listener.local_addr() {
        info!("server is running on {addr}");
    }

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // A short timeout lets the loop notice the shutdown flag even when
        // nobody is connecting.
        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    supervise(stream, peer, state).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g. out of file descriptors); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }
}
