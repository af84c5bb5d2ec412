//! Client side of the login exchange.
//!
//! The server drives the conversation; the client only reacts to the
//! status of each message it receives:
//!
//! | status | client action                                             |
//! |--------|-----------------------------------------------------------|
//! | 102    | print the prompt, read a line, send it as `content`       |
//! | 101    | print the information and wait for the next prompt        |
//! | 100    | print the welcome, take `username`, send the UDP port     |
//! | 103    | print the information and give up                         |

use edge_core::protocol::message::fields;
use edge_core::{ChannelError, Command, Message, MessageStream, Status};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::application::console::Console;
use crate::error::ClientError;

/// How the login exchange ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    /// The server accepted the credentials and knows our UDP port.
    LoggedIn { username: String },
    /// The account is locked out.
    Blocked,
    /// The console reached end of input before login finished.
    Abandoned,
}

/// Answers the server's login prompts until it accepts or blocks us.
///
/// # Errors
///
/// Returns [`ClientError::Channel`] if the connection fails or the server
/// sends a message with an unexpected status, and [`ClientError::Input`] if
/// the console cannot be read.
pub async fn run_login<S, C>(
    channel: &mut MessageStream<S>,
    console: &mut C,
    udp_port: u16,
) -> Result<LoginResult, ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: Console,
{
    loop {
        let msg = channel.recv().await?;
        match msg.status() {
            Some(Status::Prompt) => {
                let prompt = msg.get(fields::PROMPT).unwrap_or_default();
                let Some(line) = console.read_line(prompt).await.map_err(ClientError::Input)? else {
                    return Ok(LoginResult::Abandoned);
                };
                channel.send(&login_content(line)).await?;
            }
            Some(Status::Error) => console.show(msg.information()),
            Some(Status::Success) => {
                console.show(msg.information());
                let username = msg
                    .require(fields::USERNAME)
                    .map_err(ChannelError::MissingField)?
                    .to_string();
                channel.send(&login_content(udp_port.to_string())).await?;
                info!(username = %username, udp_port, "logged in");
                return Ok(LoginResult::LoggedIn { username });
            }
            Some(Status::Blocked) => {
                console.show(msg.information());
                debug!("account blocked");
                return Ok(LoginResult::Blocked);
            }
            _ => {
                return Err(ChannelError::InvalidField {
                    field: fields::STATUS,
                    value: msg.get(fields::STATUS).unwrap_or_default().to_string(),
                }
                .into())
            }
        }
    }
}

fn login_content(content: String) -> Message {
    Message::new(Command::Login).with(fields::CONTENT, content)
}
