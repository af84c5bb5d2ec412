//! Post-login command dispatcher.
//!
//! Each request is answered with exactly one reply, except `OUT` (ends the
//! session) and unrecognised commands (ignored, no reply).  Every command
//! acts on the session's own username; a `username` field in the request is
//! never consulted.
//!
//! Storage failures become `101`/`104` replies and the session continues.
//! A request missing a field its command needs, or carrying an unusable
//! `fileID`/`operation`, ends the session.

use edge_core::protocol::message::fields;
use edge_core::{datafile_name, ChannelError, Command, ComputeOperation, FileId, Message, Status};
use tracing::{info, warn};

use crate::infrastructure::storage::datafiles::DataError;
use crate::state::ServerState;

/// What the supervisor should do after one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Send this reply and keep serving.
    Reply(Message),
    /// The client logged out.
    Logout,
    /// Unrecognised command: send nothing and keep serving.
    Ignored,
}

/// Routes requests for one authenticated user.
pub struct CommandDispatcher<'a> {
    state: &'a ServerState,
    username: &'a str,
}

impl<'a> CommandDispatcher<'a> {
    pub fn new(state: &'a ServerState, username: &'a str) -> Self {
        Self { state, username }
    }

    /// Handles one request.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::MissingField`] or
    /// [`ChannelError::InvalidField`] for a malformed request; the session
    /// must end.
    pub async fn dispatch(&self, request: &Message) -> Result<Dispatch, ChannelError> {
        let Some(command) = request.command() else {
            warn!(
                username = self.username,
                command = ?request.command_verb(),
                "ignoring unrecognised command"
            );
            return Ok(Dispatch::Ignored);
        };
        info!(username = self.username, %command, "command issued");

        let reply = match command {
            Command::UploadData => self.upload(request).await?,
            Command::Compute => self.compute(request).await?,
            Command::Delete => self.delete(request).await?,
            Command::ActiveDevices => self.active_devices().await,
            Command::Logout => return Ok(Dispatch::Logout),
            Command::Login => {
                warn!(username = self.username, "ignoring LOGIN after authentication");
                return Ok(Dispatch::Ignored);
            }
        };
        info!(
            username = self.username,
            status = ?reply.status(),
            information = reply.information(),
            "reply"
        );
        Ok(Dispatch::Reply(reply))
    }

    async fn upload(&self, request: &Message) -> Result<Message, ChannelError> {
        let file_id = file_id(request)?;
        let content = request
            .require(fields::CONTENT)
            .map_err(ChannelError::MissingField)?;
        let name = datafile_name(self.username, file_id);

        let result = match self.state.data.write(self.username, file_id, content).await {
            Ok(lines) => self
                .state
                .logs
                .append_upload(self.username, file_id, lines)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        Ok(match result {
            Ok(()) => reply(Command::UploadData, Status::Success, format!("File {name} uploaded.")),
            Err(e) => {
                warn!(username = self.username, "upload failed: {e}");
                reply(
                    Command::UploadData,
                    Status::Error,
                    format!("File {name} upload failed."),
                )
            }
        })
    }

    async fn compute(&self, request: &Message) -> Result<Message, ChannelError> {
        let file_id = file_id(request)?;
        let raw = request
            .require(fields::OPERATION)
            .map_err(ChannelError::MissingField)?;
        let operation: ComputeOperation = raw.parse().map_err(|()| ChannelError::InvalidField {
            field: fields::OPERATION,
            value: raw.to_string(),
        })?;
        let name = datafile_name(self.username, file_id);

        Ok(match self.state.data.read_integers(self.username, file_id).await {
            Ok(values) => match operation.apply(&values) {
                Ok(result) => reply(
                    Command::Compute,
                    Status::Success,
                    format!("{operation} of {name}: {result}"),
                ),
                Err(e) => {
                    warn!(username = self.username, file = %name, "compute failed: {e}");
                    reply(Command::Compute, Status::Error, "Server computing service failed")
                }
            },
            Err(DataError::NotFound(_)) => reply(
                Command::Compute,
                Status::NotFound,
                format!("File: {name} not found on server"),
            ),
            Err(e) => {
                warn!(username = self.username, "compute failed: {e}");
                reply(Command::Compute, Status::Error, "Server computing service failed")
            }
        })
    }

    async fn delete(&self, request: &Message) -> Result<Message, ChannelError> {
        let file_id = file_id(request)?;
        let name = datafile_name(self.username, file_id);

        let result = match self.state.data.delete(self.username, file_id).await {
            Ok(lines) => self
                .state
                .logs
                .append_deletion(self.username, file_id, lines)
                .await
                .map_err(|e| Some(e.to_string())),
            Err(DataError::NotFound(_)) => Err(None),
            Err(e) => Err(Some(e.to_string())),
        };

        Ok(match result {
            Ok(()) => reply(Command::Delete, Status::Success, format!("File: {name} deleted.")),
            Err(None) => reply(
                Command::Delete,
                Status::NotFound,
                format!("File: {name} not found on the server"),
            ),
            Err(Some(e)) => {
                warn!(username = self.username, "delete failed: {e}");
                reply(
                    Command::Delete,
                    Status::Error,
                    format!("File: {name} delete failed"),
                )
            }
        })
    }

    async fn active_devices(&self) -> Message {
        match self.state.logs.active_devices_except(self.username).await {
            Ok(listing) => reply(
                Command::ActiveDevices,
                Status::Success,
                "Successfully found the list of active devices",
            )
            .with(fields::CONTENT, listing),
            Err(e) => {
                warn!(username = self.username, "device listing failed: {e}");
                reply(
                    Command::ActiveDevices,
                    Status::Error,
                    "Failed to get active edge devices.",
                )
            }
        }
    }
}

fn file_id(request: &Message) -> Result<FileId, ChannelError> {
    let raw = request
        .require(fields::FILE_ID)
        .map_err(ChannelError::MissingField)?;
    raw.parse().map_err(|_| ChannelError::InvalidField {
        field: fields::FILE_ID,
        value: raw.to_string(),
    })
}

fn reply(command: Command, status: Status, information: impl Into<String>) -> Message {
    Message::reply(command, status).with(fields::INFORMATION, information)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::login::MockCredentialStore;
    use crate::infrastructure::storage::config::ServerConfig;
    use edge_core::NO_OTHER_DEVICES;
    use std::net::{IpAddr, Ipv4Addr};
    use tempfile::TempDir;

    fn make_state() -> (TempDir, ServerState) {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::rooted_at(dir.path());
        let state = ServerState::with_credentials(&config, 3, Box::new(MockCredentialStore::new()));
        (dir, state)
    }

    fn upload(file_id: &str, content: &str) -> Message {
        Message::new(Command::UploadData)
            .with(fields::FILE_ID, file_id)
            .with(fields::CONTENT, content)
    }

    fn compute(file_id: &str, op: &str) -> Message {
        Message::new(Command::Compute)
            .with(fields::FILE_ID, file_id)
            .with(fields::OPERATION, op)
    }

    fn delete(file_id: &str) -> Message {
        Message::new(Command::Delete).with(fields::FILE_ID, file_id)
    }

    async fn expect_reply(dispatcher: &CommandDispatcher<'_>, request: Message) -> Message {
        match dispatcher.dispatch(&request).await.unwrap() {
            Dispatch::Reply(msg) => msg,
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_compute_delete_round_trip() {
        // Arrange
        let (dir, state) = make_state();
        let d = CommandDispatcher::new(&state, "alice");

        // Act
        let up = expect_reply(&d, upload("1", "4\n8\n-2\n")).await;
        let sum = expect_reply(&d, compute("1", "SUM")).await;
        let avg = expect_reply(&d, compute("1", "AVERAGE")).await;
        let del = expect_reply(&d, delete("1")).await;
        let gone = expect_reply(&d, compute("1", "SUM")).await;

        // Assert
        assert_eq!(up.status(), Some(Status::Success));
        assert_eq!(up.information(), "File alice-1.txt uploaded.");
        assert_eq!(sum.information(), "SUM of alice-1.txt: 10");
        assert_eq!(avg.information(), "AVERAGE of alice-1.txt: 3.3333333333333335");
        assert_eq!(del.status(), Some(Status::Success));
        assert_eq!(del.information(), "File: alice-1.txt deleted.");
        assert_eq!(gone.status(), Some(Status::NotFound));
        assert_eq!(gone.information(), "File: alice-1.txt not found on server");

        let uploads = std::fs::read_to_string(dir.path().join("upload-log.txt")).unwrap();
        assert!(uploads.starts_with("alice; "));
        assert!(uploads.trim_end().ends_with("; 1; 3"));
        let deletions = std::fs::read_to_string(dir.path().join("deletion-log.txt")).unwrap();
        assert!(deletions.trim_end().ends_with("; 1; 3"));
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_not_found() {
        let (dir, state) = make_state();
        let d = CommandDispatcher::new(&state, "alice");

        let reply = expect_reply(&d, delete("9")).await;

        assert_eq!(reply.status(), Some(Status::NotFound));
        assert_eq!(reply.information(), "File: alice-9.txt not found on the server");
        assert!(!dir.path().join("deletion-log.txt").exists());
    }

    #[tokio::test]
    async fn test_compute_on_corrupt_file_is_service_failure() {
        let (_dir, state) = make_state();
        let d = CommandDispatcher::new(&state, "alice");
        expect_reply(&d, upload("2", "1\ntwo\n")).await;

        let reply = expect_reply(&d, compute("2", "MAX")).await;

        assert_eq!(reply.status(), Some(Status::Error));
        assert_eq!(reply.information(), "Server computing service failed");
    }

    #[tokio::test]
    async fn test_sum_overflow_is_service_failure() {
        let (_dir, state) = make_state();
        let d = CommandDispatcher::new(&state, "alice");
        expect_reply(&d, upload("4", "9223372036854775807\n1\n")).await;

        let sum = expect_reply(&d, compute("4", "SUM")).await;
        let max = expect_reply(&d, compute("4", "MAX")).await;

        assert_eq!(sum.status(), Some(Status::Error));
        assert_eq!(sum.information(), "Server computing service failed");
        assert_eq!(max.information(), "MAX of alice-4.txt: 9223372036854775807");
    }

    #[tokio::test]
    async fn test_compute_on_empty_file_yields_zero() {
        let (_dir, state) = make_state();
        let d = CommandDispatcher::new(&state, "alice");
        expect_reply(&d, upload("3", "")).await;

        assert_eq!(
            expect_reply(&d, compute("3", "MIN")).await.information(),
            "MIN of alice-3.txt: 0"
        );
        assert_eq!(
            expect_reply(&d, compute("3", "AVERAGE")).await.information(),
            "AVERAGE of alice-3.txt: 0.0"
        );
    }

    #[tokio::test]
    async fn test_requests_only_touch_the_session_user() {
        // Arrange – bob owns file 1; alice asks for file 1 while naming bob.
        let (_dir, state) = make_state();
        expect_reply(&CommandDispatcher::new(&state, "bob"), upload("1", "5\n")).await;
        let alice = CommandDispatcher::new(&state, "alice");

        // Act
        let reply = expect_reply(&alice, compute("1", "SUM").with(fields::USERNAME, "bob")).await;

        // Assert
        assert_eq!(reply.status(), Some(Status::NotFound));
        assert!(reply.information().contains("alice-1.txt"));
    }

    #[tokio::test]
    async fn test_active_devices_lists_others_only() {
        // Arrange
        let (_dir, state) = make_state();
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        state.logs.append_device("alice", ip, 6000).await.unwrap();
        let d = CommandDispatcher::new(&state, "alice");

        // Act
        let alone = expect_reply(&d, Message::new(Command::ActiveDevices)).await;
        state.logs.append_device("bob", ip, 6001).await.unwrap();
        let with_bob = expect_reply(&d, Message::new(Command::ActiveDevices)).await;

        // Assert
        assert_eq!(alone.status(), Some(Status::Success));
        assert_eq!(alone.get(fields::CONTENT), Some(NO_OTHER_DEVICES));
        let content = with_bob.get(fields::CONTENT).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("Username: bob,"));
    }

    #[tokio::test]
    async fn test_logout_and_unknown_commands() {
        let (_dir, state) = make_state();
        let d = CommandDispatcher::new(&state, "alice");

        assert_eq!(d.dispatch(&Message::new(Command::Logout)).await.unwrap(), Dispatch::Logout);
        let unknown = Message::default().with(fields::COMMAND, "XYZ");
        assert_eq!(d.dispatch(&unknown).await.unwrap(), Dispatch::Ignored);
        assert_eq!(d.dispatch(&Message::default()).await.unwrap(), Dispatch::Ignored);
    }

    #[tokio::test]
    async fn test_malformed_requests_are_fatal() {
        let (_dir, state) = make_state();
        let d = CommandDispatcher::new(&state, "alice");

        assert!(matches!(
            d.dispatch(&Message::new(Command::Delete)).await,
            Err(ChannelError::MissingField("fileID"))
        ));
        assert!(matches!(
            d.dispatch(&delete("0")).await,
            Err(ChannelError::InvalidField { field: "fileID", .. })
        ));
        assert!(matches!(
            d.dispatch(&compute("1", "MEDIAN")).await,
            Err(ChannelError::InvalidField { field: "operation", .. })
        ));
        assert!(matches!(
            d.dispatch(&Message::new(Command::UploadData).with(fields::FILE_ID, "1")).await,
            Err(ChannelError::MissingField("content"))
        ));
    }
}
