//! Active-device records as shown by the `AED` command.
//!
//! The server renders one line per device other than the requester:
//!
//! ```text
//! Username: alice, Active From: 05 October 2022 14:03:11, IP Address: 127.0.0.1, UDP Port: 6000
//! ```
//!
//! and the client parses the same lines back to find a peer's datagram
//! endpoint for `UVF`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Listing content when no other device is active.
pub const NO_OTHER_DEVICES: &str = "No other active edge devices\n";

const USERNAME_LABEL: &str = "Username: ";
const ACTIVE_FROM_LABEL: &str = ", Active From: ";
const IP_LABEL: &str = ", IP Address: ";
const PORT_LABEL: &str = ", UDP Port: ";

/// A listing line that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed active-device line: {0:?}")]
pub struct DeviceParseError(pub String);

/// One logged-in device as seen by other devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDevice {
    pub username: String,
    pub active_from: String,
    pub ip: String,
    pub udp_port: u16,
}

impl fmt::Display for ActiveDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{USERNAME_LABEL}{}{ACTIVE_FROM_LABEL}{}{IP_LABEL}{}{PORT_LABEL}{}",
            self.username, self.active_from, self.ip, self.udp_port
        )
    }
}

impl FromStr for ActiveDevice {
    type Err = DeviceParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let bad = || DeviceParseError(line.to_string());

        let rest = line.trim_end().strip_prefix(USERNAME_LABEL).ok_or_else(bad)?;
        let (username, rest) = rest.split_once(ACTIVE_FROM_LABEL).ok_or_else(bad)?;
        let (active_from, rest) = rest.split_once(IP_LABEL).ok_or_else(bad)?;
        let (ip, port) = rest.split_once(PORT_LABEL).ok_or_else(bad)?;
        let udp_port = port.trim().parse().map_err(|_| bad())?;

        Ok(Self {
            username: username.to_string(),
            active_from: active_from.to_string(),
            ip: ip.to_string(),
            udp_port,
        })
    }
}

/// Renders devices as listing content, one line each.  An empty slice renders
/// as [`NO_OTHER_DEVICES`].
pub fn render_listing(devices: &[ActiveDevice]) -> String {
    if devices.is_empty() {
        return NO_OTHER_DEVICES.to_string();
    }
    devices.iter().map(|d| format!("{d}\n")).collect()
}

/// Parses listing content back into devices.  Lines that are not device
/// records (the sentinel, blank lines) are skipped.
pub fn parse_listing(content: &str) -> Vec<ActiveDevice> {
    content.lines().filter_map(|line| line.parse().ok()).collect()
}
