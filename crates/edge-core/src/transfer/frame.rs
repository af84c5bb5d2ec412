//! Datagram frame codec.
//!
//! Control frames are UTF-8 text with a reserved prefix; anything else is a
//! raw data chunk:
//!
//! | Frame      | Bytes                              |
//! |------------|------------------------------------|
//! | `FileInfo` | `FileInfo <sender> <filename>`     |
//! | `Finished` | `Finished`                         |
//! | `Ack`      | `ACK`                              |
//! | `Data`     | raw bytes, at most [`MAX_CHUNK_SIZE`] |
//!
//! Classification is by prefix alone, so a data chunk that happens to begin
//! with one of the reserved prefixes is read as a control frame.  The wire
//! format has no escape mechanism for this.

use thiserror::Error;

/// Largest data chunk a sender puts in one datagram.
pub const MAX_CHUNK_SIZE: usize = 1024;

/// Receive buffer size; large enough for any UDP payload.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

const FILE_INFO_PREFIX: &[u8] = b"FileInfo ";
const FINISHED: &[u8] = b"Finished";
const ACK: &[u8] = b"ACK";

/// A `FileInfo` datagram that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("FileInfo frame is not valid UTF-8")]
    NotUtf8,
    #[error("FileInfo frame {0:?} lacks a sender or filename")]
    MissingField(String),
}

/// One datagram of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Opens a transfer of `filename` from the device named `sender`.
    FileInfo { sender: String, filename: String },
    /// A chunk of file content.
    Data(Vec<u8>),
    /// Ends the current transfer.
    Finished,
    /// Acknowledges the previous frame.
    Ack,
}

impl Frame {
    /// Serializes the frame into datagram bytes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Frame::FileInfo { sender, filename } => {
                let mut buf = FILE_INFO_PREFIX.to_vec();
                buf.extend_from_slice(sender.as_bytes());
                buf.push(b' ');
                buf.extend_from_slice(filename.as_bytes());
                buf
            }
            Frame::Data(chunk) => chunk.clone(),
            Frame::Finished => FINISHED.to_vec(),
            Frame::Ack => ACK.to_vec(),
        }
    }

    /// Classifies a received datagram.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] only for a `FileInfo` frame whose text is not
    /// UTF-8 or does not carry both names.  Every other byte sequence decodes.
    pub fn decode(datagram: &[u8]) -> Result<Frame, FrameError> {
        if let Some(rest) = datagram.strip_prefix(FILE_INFO_PREFIX) {
            let text = std::str::from_utf8(rest).map_err(|_| FrameError::NotUtf8)?;
            return match text.split_once(' ') {
                Some((sender, filename)) if !sender.is_empty() && !filename.is_empty() => {
                    Ok(Frame::FileInfo {
                        sender: sender.to_string(),
                        filename: filename.to_string(),
                    })
                }
                _ => Err(FrameError::MissingField(text.to_string())),
            };
        }
        if datagram.starts_with(FINISHED) {
            return Ok(Frame::Finished);
        }
        if datagram.starts_with(ACK) {
            return Ok(Frame::Ack);
        }
        Ok(Frame::Data(datagram.to_vec()))
    }
}
