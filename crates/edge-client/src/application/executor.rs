//! Runs validated console commands against the server.
//!
//! Local commands (`EDG`) and local checks (the file to upload or transfer
//! must exist) never touch the control channel.  Server commands send one
//! request and print the single reply as `CMD: information`, or
//! `CMD: ERROR - information` when the server reports an error.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use edge_core::protocol::message::fields;
use edge_core::{datafile_name, ChannelError, Command, FileId, Message, MessageStream, Status};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::application::commands::{parse_command, UserCommand, Verb, COMMAND_PROMPT};
use crate::application::console::Console;
use crate::application::generate::generate_file;
use crate::application::peers::find_peer;
use crate::error::ClientError;

/// Starts peer-to-peer file transfers.
///
/// Implementations return immediately; the transfer runs in the background
/// and reports its progress on its own.
#[cfg_attr(test, mockall::automock)]
pub trait FileSender: Send + Sync {
    /// Sends the file at `path` to `device` listening on `addr`.
    fn start_transfer(&self, device: String, addr: SocketAddr, path: PathBuf);
}

/// Whether the command loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Executes commands for one logged-in user.
pub struct CommandExecutor<S, C, F> {
    channel: MessageStream<S>,
    console: C,
    sender: F,
    username: String,
    work_dir: PathBuf,
}

impl<S, C, F> CommandExecutor<S, C, F>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: Console,
    F: FileSender,
{
    pub fn new(
        channel: MessageStream<S>,
        console: C,
        sender: F,
        username: impl Into<String>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            channel,
            console,
            sender,
            username: username.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Reads, validates, and executes commands until `OUT` or end of input.
    ///
    /// # Errors
    ///
    /// Returns the first connection-fatal error.  Usage errors are printed
    /// and the loop continues.
    pub async fn run(&mut self) -> Result<(), ClientError> {
        loop {
            let Some(line) = self
                .console
                .read_line(COMMAND_PROMPT)
                .await
                .map_err(ClientError::Input)?
            else {
                return Ok(());
            };

            match parse_command(&line) {
                Ok(command) => {
                    if self.execute(command).await? == Flow::Exit {
                        return Ok(());
                    }
                }
                Err(usage) => self.console.show(&usage.to_string()),
            }
        }
    }

    /// Executes one command.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Channel`] if the control channel fails or the
    /// server's reply is unusable.
    pub async fn execute(&mut self, command: UserCommand) -> Result<Flow, ClientError> {
        debug!(?command, "executing command");
        match command {
            UserCommand::Generate { file_id, amount } => self.generate(file_id, amount).await,
            UserCommand::Upload { file_id } => self.upload(file_id).await?,
            UserCommand::Compute { file_id, operation } => {
                let request = Message::new(Command::Compute)
                    .with(fields::FILE_ID, file_id.to_string())
                    .with(fields::OPERATION, operation.as_str());
                let reply = self.channel.request(&request).await?;
                self.show_reply(Verb::Scs, &reply)?;
            }
            UserCommand::Delete { file_id } => {
                let request = Message::new(Command::Delete).with(fields::FILE_ID, file_id.to_string());
                let reply = self.channel.request(&request).await?;
                self.show_reply(Verb::Dte, &reply)?;
            }
            UserCommand::ActiveDevices => {
                let reply = self.channel.request(&Message::new(Command::ActiveDevices)).await?;
                if self.show_reply(Verb::Aed, &reply)? {
                    let listing = reply.get(fields::CONTENT).unwrap_or_default();
                    for line in listing.lines() {
                        self.console.show(line);
                    }
                }
            }
            UserCommand::Transfer { device, filename } => self.transfer(device, filename).await?,
            UserCommand::Logout => {
                self.channel.send(&Message::new(Command::Logout)).await?;
                self.console.show(&format!("Bye, {}!", self.username));
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Consumes the executor and returns the console.
    pub fn into_console(self) -> C {
        self.console
    }

    async fn generate(&mut self, file_id: FileId, amount: u32) {
        let name = datafile_name(&self.username, file_id);
        self.console.show(&format!(
            "EDG: Generating datafile {name} with {amount} data samples..."
        ));

        let mut rng = StdRng::from_entropy();
        match generate_file(&self.work_dir.join(&name), &mut rng, amount).await {
            Ok(()) => self.console.show("EDG: Data file generated."),
            Err(e) => {
                warn!(file = %name, "failed to write datafile: {e}");
                self.console.show("EDG: ERROR - Failed to generate datafile.");
            }
        }
    }

    async fn upload(&mut self, file_id: FileId) -> Result<(), ClientError> {
        let name = datafile_name(&self.username, file_id);
        let path = self.work_dir.join(&name);
        if !is_file(&path).await {
            self.console.show(&format!(
                "UED: ERROR - The file {name} to be uploaded does not exist."
            ));
            return Ok(());
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(file = %name, "failed to read datafile: {e}");
                self.console.show("UED: ERROR - Failed to upload data file.");
                return Ok(());
            }
        };

        let request = Message::new(Command::UploadData)
            .with(fields::FILE_ID, file_id.to_string())
            .with(fields::CONTENT, content);
        let reply = self.channel.request(&request).await?;
        self.show_reply(Verb::Ued, &reply)?;
        Ok(())
    }

    async fn transfer(&mut self, device: String, filename: String) -> Result<(), ClientError> {
        let reply = self.channel.request(&Message::new(Command::ActiveDevices)).await?;
        if reply.status() != Some(Status::Success) {
            self.show_reply(Verb::Uvf, &reply)?;
            return Ok(());
        }

        let listing = reply.get(fields::CONTENT).unwrap_or_default();
        let Some(addr) = find_peer(listing, &device) else {
            self.console.show(&format!("UVF: ERROR - {device} is offline."));
            return Ok(());
        };

        let path = self.work_dir.join(&filename);
        if !is_file(&path).await {
            self.console.show(&format!(
                "UVF: ERROR - The file {filename} to be transferred does not exist."
            ));
            return Ok(());
        }

        self.sender.start_transfer(device, addr, path);
        Ok(())
    }

    /// Prints a server reply.  Returns `true` for success.
    fn show_reply(&mut self, verb: Verb, reply: &Message) -> Result<bool, ChannelError> {
        match reply.status() {
            Some(Status::Success) => {
                self.console.show(&format!("{verb}: {}", reply.information()));
                Ok(true)
            }
            Some(status) if status.is_error() => {
                self.console
                    .show(&format!("{verb}: ERROR - {}", reply.information()));
                Ok(false)
            }
            _ => Err(ChannelError::InvalidField {
                field: fields::STATUS,
                value: reply.get(fields::STATUS).unwrap_or_default().to_string(),
            }),
        }
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
