//! Async message stream for the control channel.
//!
//! TCP is a *stream* protocol: one `read()` may return part of a message or
//! several messages at once.  [`MessageStream`] restores message boundaries by
//! reading the fixed 8-byte header first, then exactly `payload_len` more
//! bytes, and hands complete [`Message`]s to the caller.
//!
//! The wrapper is generic over any `AsyncRead + AsyncWrite` so the same code
//! drives a `TcpStream` in production and a `tokio::io::duplex` pipe in tests.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::protocol::codec::{decode_header, decode_payload, encode_message, ProtocolError, HEADER_SIZE};
use crate::protocol::message::Message;

/// Errors raised while exchanging messages on the control channel.
///
/// Every variant is connection-fatal: the owning unit stops using the stream
/// and runs its teardown.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The peer closed the stream at a message boundary.
    #[error("connection closed by peer")]
    Closed,

    /// The underlying stream failed (reset, broken pipe, truncated frame).
    #[error("connection I/O error: {0}")]
    Io(#[from] io::Error),

    /// A frame arrived but could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A message lacked a field its receiver requires.
    #[error("message is missing required field `{0}`")]
    MissingField(&'static str),

    /// A field was present but its value was unusable.
    #[error("field `{field}` has invalid value {value:?}")]
    InvalidField { field: &'static str, value: String },
}

impl ChannelError {
    /// `true` when the peer went away rather than misbehaved.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ChannelError::Closed => true,
            ChannelError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

/// Reads and writes whole [`Message`]s over a byte stream.
#[derive(Debug)]
pub struct MessageStream<S> {
    inner: S,
}

impl<S> MessageStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected byte stream.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Encodes `msg` and writes it in full.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Protocol`] if the message cannot be encoded and
    /// [`ChannelError::Io`] if the write fails.
    pub async fn send(&mut self, msg: &Message) -> Result<(), ChannelError> {
        let bytes = encode_message(msg)?;
        trace!(command = ?msg.command_verb(), len = bytes.len(), "sending message");
        self.inner.write_all(&bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Waits for the next complete message.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] on end-of-stream before a header,
    /// [`ChannelError::Io`] on a read failure or a frame cut short, and
    /// [`ChannelError::Protocol`] if the frame is undecodable.
    pub async fn recv(&mut self) -> Result<Message, ChannelError> {
        let mut header = [0u8; HEADER_SIZE];
        match self.inner.read_exact(&mut header).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(ChannelError::Closed),
            Err(e) => return Err(e.into()),
        }

        let payload_len = decode_header(&header)?;
        let mut payload = vec![0u8; payload_len];
        self.inner.read_exact(&mut payload).await?;
        let msg = decode_payload(&payload)?;
        trace!(command = ?msg.command_verb(), len = payload_len, "received message");
        Ok(msg)
    }

    /// Sends `request` and waits for the single reply.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`send`](Self::send) or [`recv`](Self::recv).
    pub async fn request(&mut self, request: &Message) -> Result<Message, ChannelError> {
        self.send(request).await?;
        self.recv().await
    }

    /// Returns a reference to the wrapped stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Consumes the wrapper and returns the stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
