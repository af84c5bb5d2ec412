//! Per-connection session state.

use std::net::SocketAddr;

use edge_core::ChannelError;
use thiserror::Error;
use uuid::Uuid;

use crate::application::login::CredentialError;
use crate::infrastructure::storage::logs::LogError;

/// Anything that ends a session before its normal close.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("credential lookup failed: {0}")]
    Credentials(#[from] CredentialError),

    #[error("device log update failed: {0}")]
    DeviceLog(#[from] LogError),
}

impl SessionError {
    /// `true` when the client simply went away.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, SessionError::Channel(e) if e.is_disconnect())
    }
}

/// State owned by one connection's supervisor.  Never shared.
#[derive(Debug)]
pub struct Session {
    /// Correlates log lines for this connection.
    pub id: Uuid,
    pub peer: SocketAddr,
    /// Wrong passwords entered on this connection.
    pub failed_attempts: u32,
    username: Option<String>,
}

impl Session {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            failed_attempts: 0,
            username: None,
        }
    }

    /// The authenticated username, or `None` before login succeeds.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub(crate) fn authenticate(&mut self, username: &str) {
        self.username = Some(username.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_anonymous() {
        let session = Session::new("127.0.0.1:50000".parse().unwrap());
        assert!(!session.is_authenticated());
        assert_eq!(session.username(), None);
        assert_eq!(session.failed_attempts, 0);
    }

    #[test]
    fn test_authenticate_binds_username() {
        let mut session = Session::new("127.0.0.1:50000".parse().unwrap());
        session.authenticate("alice");
        assert_eq!(session.username(), Some("alice"));
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let peer = "127.0.0.1:50000".parse().unwrap();
        assert_ne!(Session::new(peer).id, Session::new(peer).id);
    }

    #[test]
    fn test_closed_channel_is_a_disconnect() {
        assert!(SessionError::from(ChannelError::Closed).is_disconnect());
        assert!(!SessionError::from(ChannelError::MissingField("content")).is_disconnect());
    }
}
