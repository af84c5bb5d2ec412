use std::io;

use edge_core::ChannelError;
use thiserror::Error;

/// An error that ends the interactive session.
///
/// Local validation problems never show up here; they are printed and the
/// command loop carries on.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached.
    #[error("failed to connect to server at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The control channel failed or the server sent something unusable.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Reading from the console failed.
    #[error("console input error: {0}")]
    Input(#[source] io::Error),
}

impl ClientError {
    /// `true` when the server went away rather than misbehaved.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, ClientError::Channel(e) if e.is_disconnect())
    }
}
