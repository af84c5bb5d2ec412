//! The control-channel message envelope and its vocabularies.
//!
//! A [`Message`] is a flat map from field name to string value.  Every message
//! carries a `command` field; server replies also carry a numeric `status`
//! plus auxiliary fields such as `information`, `prompt`, and `content`.
//!
//! The envelope performs no validation of its own.  Each consumer looks up
//! the fields it needs (see [`Message::require`]) and treats anything missing
//! as a protocol error.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Field names ───────────────────────────────────────────────────────────────

/// Field names used on the control channel.
pub mod fields {
    pub const COMMAND: &str = "command";
    pub const STATUS: &str = "status";
    pub const INFORMATION: &str = "information";
    pub const PROMPT: &str = "prompt";
    pub const CONTENT: &str = "content";
    pub const USERNAME: &str = "username";
    pub const FILE_ID: &str = "fileID";
    pub const OPERATION: &str = "operation";
}

// ── Status codes ──────────────────────────────────────────────────────────────

/// Server → client status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Status {
    /// The request succeeded.
    Success = 100,
    /// Recoverable error, or plain information.
    Error = 101,
    /// The server wants input; the reply's `content` carries it.
    Prompt = 102,
    /// Account blocked; terminal for this login attempt.
    Blocked = 103,
    /// The requested datafile does not exist.
    NotFound = 104,
}

impl Status {
    /// Returns the wire representation, e.g. `"100"`.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// `true` for the two error variants the client labels with `ERROR`.
    pub fn is_error(self) -> bool {
        matches!(self, Status::Error | Status::NotFound)
    }
}

impl TryFrom<u16> for Status {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, ()> {
        match value {
            100 => Ok(Status::Success),
            101 => Ok(Status::Error),
            102 => Ok(Status::Prompt),
            103 => Ok(Status::Blocked),
            104 => Ok(Status::NotFound),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// The `command` field vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Pre-login exchange: username, password, then the UDP port.
    Login,
    /// Upload a datafile (`fileID`, `content`).
    UploadData,
    /// Server computation service (`fileID`, `operation`).
    Compute,
    /// Delete a datafile (`fileID`).
    Delete,
    /// List other active edge devices.
    ActiveDevices,
    /// Log out and close the session.
    Logout,
}

impl Command {
    /// The on-the-wire verb.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Login => "LOGIN",
            Command::UploadData => "UED",
            Command::Compute => "SCS",
            Command::Delete => "DTE",
            Command::ActiveDevices => "AED",
            Command::Logout => "OUT",
        }
    }
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "LOGIN" => Ok(Command::Login),
            "UED" => Ok(Command::UploadData),
            "SCS" => Ok(Command::Compute),
            "DTE" => Ok(Command::Delete),
            "AED" => Ok(Command::ActiveDevices),
            "OUT" => Ok(Command::Logout),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Message envelope ──────────────────────────────────────────────────────────

/// A control-channel message: a flat string-to-string map.
///
/// Construct with [`Message::new`] or [`Message::reply`] and chain
/// [`Message::with`]; once handed to the codec the value is only read.
///
/// # Examples
///
/// ```rust
/// use edge_core::protocol::message::{fields, Command, Message, Status};
///
/// let msg = Message::reply(Command::Compute, Status::NotFound)
///     .with(fields::INFORMATION, "File: alice-1.txt not found on server");
/// assert_eq!(msg.status(), Some(Status::NotFound));
/// assert_eq!(msg.command_verb(), Some("SCS"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    fields: BTreeMap<String, String>,
}

impl Message {
    /// Creates a message carrying only the `command` field.
    pub fn new(command: Command) -> Self {
        Self::default().with(fields::COMMAND, command.as_str())
    }

    /// Creates a server reply carrying `command` and `status`.
    pub fn reply(command: Command, status: Status) -> Self {
        Self::new(command).with(fields::STATUS, status.code().to_string())
    }

    /// Returns the message with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Looks up a field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// The raw `command` verb, if present.
    pub fn command_verb(&self) -> Option<&str> {
        self.get(fields::COMMAND)
    }

    /// The parsed `command`, or `None` when missing or unrecognised.
    pub fn command(&self) -> Option<Command> {
        self.command_verb().and_then(|v| v.parse().ok())
    }

    /// The parsed `status`, or `None` when missing or unrecognised.
    pub fn status(&self) -> Option<Status> {
        self.get(fields::STATUS)
            .and_then(|s| s.parse::<u16>().ok())
            .and_then(|code| Status::try_from(code).ok())
    }

    /// The `information` text, or an empty string.
    pub fn information(&self) -> &str {
        self.get(fields::INFORMATION).unwrap_or_default()
    }

    /// Looks up a field the caller cannot proceed without.
    ///
    /// # Errors
    ///
    /// Returns the missing field's name so the caller can build a protocol
    /// error around it.
    pub fn require(&self, key: &'static str) -> Result<&str, &'static str> {
        self.get(key).ok_or(key)
    }

    /// Number of fields in the envelope.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if the envelope has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
