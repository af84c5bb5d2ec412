//! File-backed logs: the active-device registry plus the upload and deletion
//! histories.
//!
//! Each log file has its own lock.  The device log derives its sequence
//! number from the line count read just before appending, so every operation
//! on one file must run under that file's lock; operations on different files
//! never contend.
//!
//! Line formats (fields joined by `"; "`):
//!
//! ```text
//! edge-device-log.txt   seq; timestamp; username; ip; udpPort
//! upload-log.txt        username; timestamp; fileID; lineCount
//! deletion-log.txt      username; timestamp; fileID; lineCount
//! ```

use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use chrono::Local;
use edge_core::domain::device::render_listing;
use edge_core::{ActiveDevice, FileId};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SEPARATOR: &str = "; ";
const TIMESTAMP_FORMAT: &str = "%d %B %Y %H:%M:%S";

/// A log file could not be read or written.
#[derive(Debug, Error)]
#[error("log file {path}: {source}")]
pub struct LogError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Current local time as written into log records, e.g.
/// `05 October 2022 14:03:11`.
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// One parsed line of the device log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub seq: usize,
    pub timestamp: String,
    pub username: String,
    pub ip: String,
    pub udp_port: u16,
}

impl DeviceRecord {
    fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(SEPARATOR).collect();
        let [seq, timestamp, username, ip, port] = fields.as_slice() else {
            return None;
        };
        Some(Self {
            seq: seq.parse().ok()?,
            timestamp: timestamp.to_string(),
            username: username.to_string(),
            ip: ip.to_string(),
            udp_port: port.trim().parse().ok()?,
        })
    }

    fn to_line(&self) -> String {
        [
            self.seq.to_string(),
            self.timestamp.clone(),
            self.username.clone(),
            self.ip.clone(),
            self.udp_port.to_string(),
        ]
        .join(SEPARATOR)
    }

    fn to_device(&self) -> ActiveDevice {
        ActiveDevice {
            username: self.username.clone(),
            active_from: self.timestamp.clone(),
            ip: self.ip.clone(),
            udp_port: self.udp_port,
        }
    }
}

/// The three server logs, each behind its own lock.
///
/// The mutexes guard the paths themselves: holding the guard is what grants
/// the right to touch the file.
#[derive(Debug)]
pub struct LogStore {
    device: Mutex<PathBuf>,
    upload: Mutex<PathBuf>,
    deletion: Mutex<PathBuf>,
}

impl LogStore {
    pub fn new(device: PathBuf, upload: PathBuf, deletion: PathBuf) -> Self {
        Self {
            device: Mutex::new(device),
            upload: Mutex::new(upload),
            deletion: Mutex::new(deletion),
        }
    }

    /// Registers `username` as active at `ip`/`udp_port` and returns the
    /// sequence number assigned to the new line.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if the device log cannot be read or appended.
    pub async fn append_device(
        &self,
        username: &str,
        ip: IpAddr,
        udp_port: u16,
    ) -> Result<usize, LogError> {
        let path = self.device.lock().await;
        let seq = read_lines(&path).await?.len() + 1;
        let record = DeviceRecord {
            seq,
            timestamp: timestamp(),
            username: username.to_string(),
            ip: ip.to_string(),
            udp_port,
        };
        append_line(&path, &record.to_line()).await?;
        info!(username, seq, "added record to device log");
        Ok(seq)
    }

    /// Drops every line for `username` and renumbers the rest from 1.
    /// Returns how many lines were removed.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if the device log cannot be read or rewritten.
    pub async fn remove_device(&self, username: &str) -> Result<usize, LogError> {
        let path = self.device.lock().await;
        let lines = read_lines(&path).await?;
        let before = lines.len();

        let mut kept = String::new();
        let mut seq = 0;
        for line in &lines {
            // Keep the fields after the sequence number verbatim.
            let Some((_, rest)) = line.split_once(SEPARATOR) else {
                warn!(line = %line, "dropping malformed device log line");
                continue;
            };
            if rest.split(SEPARATOR).nth(1) == Some(username) {
                continue;
            }
            seq += 1;
            kept.push_str(&format!("{seq}{SEPARATOR}{rest}\n"));
        }

        fs::write(&*path, kept).await.map_err(|source| LogError {
            path: path.clone(),
            source,
        })?;
        let removed = before - seq;
        info!(username, removed, "deleted record from device log");
        Ok(removed)
    }

    /// Renders the listing of every active device except `username`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if the device log cannot be read.
    pub async fn active_devices_except(&self, username: &str) -> Result<String, LogError> {
        let path = self.device.lock().await;
        let devices: Vec<ActiveDevice> = read_lines(&path)
            .await?
            .iter()
            .filter_map(|line| {
                let record = DeviceRecord::parse(line);
                if record.is_none() {
                    warn!(line = %line, "skipping malformed device log line");
                }
                record
            })
            .filter(|record| record.username != username)
            .map(|record| record.to_device())
            .collect();
        debug!(username, count = devices.len(), "queried device log");
        Ok(render_listing(&devices))
    }

    /// Parsed device log lines, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if the device log cannot be read.
    pub async fn device_records(&self) -> Result<Vec<DeviceRecord>, LogError> {
        let path = self.device.lock().await;
        Ok(read_lines(&path)
            .await?
            .iter()
            .filter_map(|line| DeviceRecord::parse(line))
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`LogError`] if the upload log cannot be appended.
    pub async fn append_upload(
        &self,
        username: &str,
        file_id: FileId,
        line_count: usize,
    ) -> Result<(), LogError> {
        let path = self.upload.lock().await;
        append_line(&path, &history_line(username, file_id, line_count)).await?;
        info!(username, %file_id, line_count, "added record to upload log");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`LogError`] if the deletion log cannot be appended.
    pub async fn append_deletion(
        &self,
        username: &str,
        file_id: FileId,
        line_count: usize,
    ) -> Result<(), LogError> {
        let path = self.deletion.lock().await;
        append_line(&path, &history_line(username, file_id, line_count)).await?;
        info!(username, %file_id, line_count, "added record to deletion log");
        Ok(())
    }
}

fn history_line(username: &str, file_id: FileId, line_count: usize) -> String {
    [
        username.to_string(),
        timestamp(),
        file_id.to_string(),
        line_count.to_string(),
    ]
    .join(SEPARATOR)
}

/// Reads all lines; a missing file has none.
async fn read_lines(path: &Path) -> Result<Vec<String>, LogError> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(text.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(LogError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn append_line(path: &Path, line: &str) -> Result<(), LogError> {
    let wrap = |source| LogError {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(wrap)?;
    file.write_all(format!("{line}\n").as_bytes())
        .await
        .map_err(wrap)?;
    file.flush().await.map_err(wrap)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::NO_OTHER_DEVICES;
    use std::net::Ipv4Addr;
    use tempfile::TempDir;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    fn make_store() -> (TempDir, LogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(
            dir.path().join("edge-device-log.txt"),
            dir.path().join("upload-log.txt"),
            dir.path().join("deletion-log.txt"),
        );
        (dir, store)
    }

    fn read(dir: &TempDir, name: &str) -> String {
        std::fs::read_to_string(dir.path().join(name)).unwrap()
    }

    #[tokio::test]
    async fn test_device_appends_are_numbered_from_one() {
        // Arrange
        let (dir, store) = make_store();

        // Act
        let a = store.append_device("alice", LOCALHOST, 6000).await.unwrap();
        let b = store.append_device("bob", LOCALHOST, 6001).await.unwrap();

        // Assert
        assert_eq!((a, b), (1, 2));
        let text = read(&dir, "edge-device-log.txt");
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("1; "));
        assert!(lines[0].ends_with("; alice; 127.0.0.1; 6000"));
        assert!(lines[1].starts_with("2; "));
    }

    #[tokio::test]
    async fn test_remove_device_renumbers_remaining_lines() {
        // Arrange
        let (dir, store) = make_store();
        store.append_device("alice", LOCALHOST, 6000).await.unwrap();
        store.append_device("bob", LOCALHOST, 6001).await.unwrap();
        store.append_device("carol", LOCALHOST, 6002).await.unwrap();

        // Act
        let removed = store.remove_device("alice").await.unwrap();

        // Assert
        assert_eq!(removed, 1);
        let records = store.device_records().await.unwrap();
        let summary: Vec<(usize, &str)> =
            records.iter().map(|r| (r.seq, r.username.as_str())).collect();
        assert_eq!(summary, vec![(1, "bob"), (2, "carol")]);
        assert_eq!(read(&dir, "edge-device-log.txt").lines().count(), 2);
    }

    #[tokio::test]
    async fn test_remove_device_drops_every_line_for_the_user() {
        let (_dir, store) = make_store();
        store.append_device("alice", LOCALHOST, 6000).await.unwrap();
        store.append_device("alice", LOCALHOST, 6100).await.unwrap();

        assert_eq!(store.remove_device("alice").await.unwrap(), 2);
        assert!(store.device_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_excludes_requester() {
        // Arrange
        let (_dir, store) = make_store();
        store.append_device("alice", LOCALHOST, 6000).await.unwrap();
        store.append_device("bob", LOCALHOST, 6001).await.unwrap();

        // Act
        let listing = store.active_devices_except("bob").await.unwrap();

        // Assert
        assert_eq!(listing.lines().count(), 1);
        assert!(listing.starts_with("Username: alice, Active From: "));
        assert!(listing.ends_with(", IP Address: 127.0.0.1, UDP Port: 6000\n"));
    }

    #[tokio::test]
    async fn test_listing_with_no_other_devices_is_sentinel() {
        let (_dir, store) = make_store();
        assert_eq!(store.active_devices_except("alice").await.unwrap(), NO_OTHER_DEVICES);
        store.append_device("alice", LOCALHOST, 6000).await.unwrap();
        assert_eq!(store.active_devices_except("alice").await.unwrap(), NO_OTHER_DEVICES);
    }

    #[tokio::test]
    async fn test_upload_and_deletion_records() {
        // Arrange
        let (dir, store) = make_store();
        let id = FileId::new(3).unwrap();

        // Act
        store.append_upload("alice", id, 10).await.unwrap();
        store.append_deletion("alice", id, 10).await.unwrap();

        // Assert
        for name in ["upload-log.txt", "deletion-log.txt"] {
            let text = read(&dir, name);
            let fields: Vec<&str> = text.trim_end().split("; ").collect();
            assert_eq!(fields.len(), 4);
            assert_eq!(fields[0], "alice");
            assert_eq!(fields[2], "3");
            assert_eq!(fields[3], "10");
        }
    }

    #[test]
    fn test_record_line_round_trip() {
        let line = "4; 05 October 2022 14:03:11; alice; 10.0.0.7; 6000";
        let record = DeviceRecord::parse(line).unwrap();
        assert_eq!(record.seq, 4);
        assert_eq!(record.timestamp, "05 October 2022 14:03:11");
        assert_eq!(record.to_line(), line);
    }

    #[test]
    fn test_timestamp_shape() {
        // e.g. "05 October 2022 14:03:11"
        let ts = timestamp();
        let parts: Vec<&str> = ts.split(' ').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[2].len(), 4);
        assert_eq!(parts[3].len(), 8);
    }
}
