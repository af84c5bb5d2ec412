//! Login state machine.
//!
//! ```text
//!        ┌────────────── 101 invalid username ─────────────┐
//!        ▼                                                  │
//!  AwaitingUsername ── known ──▶ blocked? ── yes ──▶ 103, AlreadyBlocked
//!                                  │ no
//!                                  ▼
//!        ┌──────────▶ AwaitingPassword ── match ──▶ 100, read UDP port,
//!        │                 │                         log device, Authenticated
//!        │                 │ mismatch
//!        │                 ▼
//!        └── 101 ── attempts < limit?  ── no ──▶ block, 103, NewlyBlocked
//! ```
//!
//! The blocked check is repeated after every password answer, so an account
//! blocked by another connection is refused here too.
//!
//! Unknown usernames are not counted.  Only wrong passwords for a known
//! username count toward the per-connection limit.

use std::path::PathBuf;

use async_trait::async_trait;
use edge_core::protocol::message::fields;
use edge_core::{ChannelError, Command, Message, MessageStream, Status};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::application::lockout::LockoutGuard;
use crate::application::session::{Session, SessionError};
use crate::state::ServerState;

pub const USERNAME_PROMPT: &str = "Username: ";
pub const PASSWORD_PROMPT: &str = "Password: ";
pub const INVALID_USERNAME: &str =
    "The username is invalid, please check your input username and try again";
pub const WRONG_PASSWORD: &str = "Wrong password, please try again!";
pub const ACCOUNT_BLOCKED: &str =
    "Your account is blocked due to multiple authentication failures. Please try again later.";

/// The credential source could not be read.
#[derive(Debug, Error)]
#[error("credential file {path}: {source}")]
pub struct CredentialError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Username/password lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `true` if `username` has an entry, regardless of password.
    async fn username_exists(&self, username: &str) -> Result<bool, CredentialError>;

    /// `true` if `username` and `password` match one entry.
    async fn verify(&self, username: &str, password: &str) -> Result<bool, CredentialError>;
}

/// How a login attempt ended.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Password accepted and the device registered.
    Authenticated { username: String },
    /// The username was already blocked when this connection tried it.
    AlreadyBlocked { username: String },
    /// This connection used up its attempts.  The account stays blocked
    /// while the guard lives.
    NewlyBlocked { lockout: LockoutGuard },
}

/// Runs the login exchange on `channel`.
///
/// On success the session is bound to the username and the device's UDP
/// port (sent by the client right after the `100` reply) is recorded in the
/// device log.
///
/// # Errors
///
/// Returns [`SessionError`] if the connection fails, a reply lacks its
/// `content` field, the UDP port is not a port number, or the credential
/// file or device log cannot be accessed.
pub async fn run_login<S>(
    channel: &mut MessageStream<S>,
    session: &mut Session,
    state: &ServerState,
) -> Result<LoginOutcome, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let username = read_username(channel, session, state).await?;

    if state.blocked.contains(&username) {
        return refuse_blocked(channel, session, username).await;
    }

    loop {
        let password = prompt(channel, PASSWORD_PROMPT).await?;
        debug!(session = %session.id, username = %username, "received password");

        // Another connection may have blocked the account while this one
        // sat at the prompt.
        if state.blocked.contains(&username) {
            return refuse_blocked(channel, session, username).await;
        }

        if state.credentials.verify(&username, &password).await? {
            return complete_login(channel, session, state, username).await;
        }

        session.failed_attempts += 1;
        if session.failed_attempts >= state.max_attempts {
            let lockout = state.blocked.block(&username);
            if let Err(e) = channel.send(&blocked_reply()).await {
                debug!(session = %session.id, "could not deliver block notice: {e}");
            }
            warn!(
                session = %session.id,
                username = %username,
                attempts = session.failed_attempts,
                "too many wrong passwords"
            );
            return Ok(LoginOutcome::NewlyBlocked { lockout });
        }

        warn!(
            session = %session.id,
            username = %username,
            attempts = session.failed_attempts,
            "wrong password"
        );
        channel.send(&error_reply(WRONG_PASSWORD)).await?;
    }
}

async fn refuse_blocked<S>(
    channel: &mut MessageStream<S>,
    session: &Session,
    username: String,
) -> Result<LoginOutcome, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!(session = %session.id, username = %username, "login refused: account is blocked");
    channel.send(&blocked_reply()).await?;
    Ok(LoginOutcome::AlreadyBlocked { username })
}

/// Prompts until the client names a known user.
async fn read_username<S>(
    channel: &mut MessageStream<S>,
    session: &Session,
    state: &ServerState,
) -> Result<String, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let input = prompt(channel, USERNAME_PROMPT).await?;
        if state.credentials.username_exists(&input).await? {
            return Ok(input);
        }
        info!(session = %session.id, username = %input, "unknown username");
        channel.send(&error_reply(INVALID_USERNAME)).await?;
    }
}

async fn complete_login<S>(
    channel: &mut MessageStream<S>,
    session: &mut Session,
    state: &ServerState,
    username: String,
) -> Result<LoginOutcome, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let welcome = format!("{username}, you have successfully logged in. Welcome!");
    channel
        .send(
            &Message::reply(Command::Login, Status::Success)
                .with(fields::INFORMATION, welcome)
                .with(fields::USERNAME, &username),
        )
        .await?;

    let reply = channel.recv().await?;
    let raw = reply
        .require(fields::CONTENT)
        .map_err(ChannelError::MissingField)?;
    let udp_port: u16 = raw.trim().parse().map_err(|_| ChannelError::InvalidField {
        field: fields::CONTENT,
        value: raw.to_string(),
    })?;

    state
        .logs
        .append_device(&username, session.peer.ip(), udp_port)
        .await?;
    session.authenticate(&username);
    info!(session = %session.id, username = %username, udp_port, "logged in");
    Ok(LoginOutcome::Authenticated { username })
}

/// Sends a `102` prompt and returns the `content` of the answer.
async fn prompt<S>(channel: &mut MessageStream<S>, text: &str) -> Result<String, ChannelError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = Message::reply(Command::Login, Status::Prompt).with(fields::PROMPT, text);
    let answer = channel.request(&request).await?;
    answer
        .require(fields::CONTENT)
        .map(str::to_string)
        .map_err(ChannelError::MissingField)
}

fn error_reply(information: &str) -> Message {
    Message::reply(Command::Login, Status::Error).with(fields::INFORMATION, information)
}

fn blocked_reply() -> Message {
    Message::reply(Command::Login, Status::Blocked).with(fields::INFORMATION, ACCOUNT_BLOCKED)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
