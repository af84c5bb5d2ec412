//! TOML-based configuration for the server.
//!
//! The port and the login-attempt limit come from the command line.  All
//! file locations and the lockout duration live in an optional TOML file:
//!
//! ```toml
//! bind_address = "0.0.0.0"
//! credentials_path = "credentials.txt"
//! device_log_path = "edge-device-log.txt"
//! upload_log_path = "upload-log.txt"
//! deletion_log_path = "deletion-log.txt"
//! data_dir = "."
//! lockout_secs = 10
//! ```
//!
//! Every field has a serde default, so a missing file or a partial file both
//! yield a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server settings that are not given on the command line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// IP address the control listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// `username password` per line.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    /// Registry of currently logged-in devices.
    #[serde(default = "default_device_log_path")]
    pub device_log_path: PathBuf,
    #[serde(default = "default_upload_log_path")]
    pub upload_log_path: PathBuf,
    #[serde(default = "default_deletion_log_path")]
    pub deletion_log_path: PathBuf,
    /// Parent of the per-user datafile directories.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// How long an account stays blocked after too many wrong passwords.
    #[serde(default = "default_lockout_secs")]
    pub lockout_secs: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.txt")
}
fn default_device_log_path() -> PathBuf {
    PathBuf::from("edge-device-log.txt")
}
fn default_upload_log_path() -> PathBuf {
    PathBuf::from("upload-log.txt")
}
fn default_deletion_log_path() -> PathBuf {
    PathBuf::from("deletion-log.txt")
}
fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_lockout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            credentials_path: default_credentials_path(),
            device_log_path: default_device_log_path(),
            upload_log_path: default_upload_log_path(),
            deletion_log_path: default_deletion_log_path(),
            data_dir: default_data_dir(),
            lockout_secs: default_lockout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn lockout(&self) -> Duration {
        Duration::from_secs(self.lockout_secs)
    }

    /// Rebases every relative path onto `root`.  Used by tests to keep all
    /// server files inside a temporary directory.
    pub fn rooted_at(root: &Path) -> Self {
        let defaults = Self::default();
        Self {
            credentials_path: root.join(defaults.credentials_path),
            device_log_path: root.join(defaults.device_log_path),
            upload_log_path: root.join(defaults.upload_log_path),
            deletion_log_path: root.join(defaults.deletion_log_path),
            data_dir: root.to_path_buf(),
            ..defaults
        }
    }
}

/// Loads the configuration from `path`, or returns the defaults when no path
/// is given or the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(ServerConfig::default());
    };

    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
