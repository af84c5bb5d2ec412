//! Process-wide server state shared by every connection.
//!
//! One [`ServerState`] is built at startup and handed to each connection
//! task behind an `Arc`.  Only the blocked-account registry and the log files
//! carry mutable shared state; both do their own locking.

use std::time::Duration;

use crate::application::lockout::BlockedSet;
use crate::application::login::CredentialStore;
use crate::infrastructure::storage::config::ServerConfig;
use crate::infrastructure::storage::credentials::FileCredentialStore;
use crate::infrastructure::storage::datafiles::DataStore;
use crate::infrastructure::storage::logs::LogStore;

pub struct ServerState {
    pub credentials: Box<dyn CredentialStore>,
    pub blocked: BlockedSet,
    pub logs: LogStore,
    pub data: DataStore,
    /// Wrong passwords allowed per connection before the account is blocked.
    pub max_attempts: u32,
    /// How long a newly blocked account stays blocked after its socket closes.
    pub lockout: Duration,
}

impl ServerState {
    /// Builds the state with file-backed credentials from `config`.
    pub fn from_config(config: &ServerConfig, max_attempts: u32) -> Self {
        let credentials = FileCredentialStore::new(config.credentials_path.clone());
        Self::with_credentials(config, max_attempts, Box::new(credentials))
    }

    /// Builds the state around an arbitrary credential store.
    pub fn with_credentials(
        config: &ServerConfig,
        max_attempts: u32,
        credentials: Box<dyn CredentialStore>,
    ) -> Self {
        Self {
            credentials,
            blocked: BlockedSet::new(),
            logs: LogStore::new(
                config.device_log_path.clone(),
                config.upload_log_path.clone(),
                config.deletion_log_path.clone(),
            ),
            data: DataStore::new(config.data_dir.clone()),
            max_attempts,
            lockout: config.lockout(),
        }
    }
}
