//! Per-connection supervisor.
//!
//! Lifecycle of one control connection:
//!
//! ```text
//! accept ─▶ login ─┬─ Authenticated ──▶ command loop until OUT / disconnect
//!                  ├─ AlreadyBlocked ─▶ (nothing)
//!                  └─ NewlyBlocked ───▶ (hold lockout guard)
//!        ─▶ close socket
//!        ─▶ if newly blocked: wait out the lockout, then unblock
//!        ─▶ if authenticated: remove the device-log entry
//! ```
//!
//! The lockout timer runs after the socket is closed, so the client sees
//! the connection end immediately.  The device-log entry is owned by a
//! `DeviceRegistration` guard, which still removes it if the task unwinds.

use std::net::SocketAddr;
use std::sync::Arc;

use edge_core::{ChannelError, MessageStream};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::runtime::Handle;
use tracing::{error, info, warn};

use crate::application::dispatch::{CommandDispatcher, Dispatch};
use crate::application::login::{run_login, LoginOutcome};
use crate::application::session::Session;
use crate::state::ServerState;

/// Owns one connection from accept to teardown.
///
/// Generic over the stream so tests can drive it with an in-memory pipe.
pub async fn supervise<S>(stream: S, peer: SocketAddr, state: Arc<ServerState>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut session = Session::new(peer);
    info!(session = %session.id, %peer, "client connected");

    let mut channel = MessageStream::new(stream);
    let mut lockout = None;
    let mut registration = None;

    match run_login(&mut channel, &mut session, &state).await {
        Ok(LoginOutcome::Authenticated { username }) => {
            registration = Some(DeviceRegistration::new(Arc::clone(&state), &username));
            match serve_commands(&mut channel, &state, &username).await {
                Ok(()) => info!(session = %session.id, username = %username, "client logged out"),
                Err(e) if e.is_disconnect() => {
                    info!(session = %session.id, username = %username, "client disconnected abnormally")
                }
                Err(e) => warn!(session = %session.id, username = %username, "session ended: {e}"),
            }
        }
        Ok(LoginOutcome::AlreadyBlocked { username }) => {
            info!(session = %session.id, username = %username, "blocked account turned away");
        }
        Ok(LoginOutcome::NewlyBlocked { lockout: guard }) => lockout = Some(guard),
        Err(e) if e.is_disconnect() => {
            info!(session = %session.id, "client disconnected during login")
        }
        Err(e) => warn!(session = %session.id, "login failed: {e}"),
    }

    drop(channel);
    info!(session = %session.id, %peer, "connection closed");

    if let Some(guard) = lockout {
        info!(
            session = %session.id,
            username = guard.username(),
            secs = state.lockout.as_secs(),
            "holding lockout"
        );
        guard.expire_after(state.lockout).await;
    }

    if let Some(registration) = registration {
        registration.release().await;
    }
}

/// Holds an authenticated user's device-log entry for the life of the
/// session.
///
/// [`release`](Self::release) removes the entry in order.  If the guard is
/// dropped without being released, for example because the connection task
/// panicked, removal is spawned onto the runtime instead.
struct DeviceRegistration {
    state: Arc<ServerState>,
    username: Option<String>,
}

impl DeviceRegistration {
    fn new(state: Arc<ServerState>, username: &str) -> Self {
        Self {
            state,
            username: Some(username.to_string()),
        }
    }

    async fn release(mut self) {
        if let Some(username) = self.username.take() {
            remove_device(&self.state, &username).await;
        }
    }
}

impl Drop for DeviceRegistration {
    fn drop(&mut self) {
        let Some(username) = self.username.take() else {
            return;
        };
        warn!(username = %username, "session ended without teardown; removing device record");
        match Handle::try_current() {
            Ok(handle) => {
                let state = Arc::clone(&self.state);
                handle.spawn(async move { remove_device(&state, &username).await });
            }
            Err(_) => error!(username = %username, "no runtime left to remove device record"),
        }
    }
}

async fn remove_device(state: &ServerState, username: &str) {
    if let Err(e) = state.logs.remove_device(username).await {
        error!(username, "failed to remove device record: {e}");
    }
}

/// Reads and answers requests until the client logs out.
async fn serve_commands<S>(
    channel: &mut MessageStream<S>,
    state: &ServerState,
    username: &str,
) -> Result<(), ChannelError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let dispatcher = CommandDispatcher::new(state, username);
    loop {
        let request = channel.recv().await?;
        match dispatcher.dispatch(&request).await? {
            Dispatch::Reply(reply) => channel.send(&reply).await?,
            Dispatch::Ignored => {}
            Dispatch::Logout => return Ok(()),
        }
    }
}
