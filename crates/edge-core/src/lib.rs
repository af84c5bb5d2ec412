//! # edge-core
//!
//! Shared library for Edge Link containing the control-channel message
//! envelope and codec, the datagram frame format used for peer-to-peer file
//! transfer, and small domain helpers shared by the server and the client.
//!
//! This crate is used by both the server and client applications.  It opens
//! no sockets and touches no files; the only I/O it knows about is the
//! `AsyncRead`/`AsyncWrite` pair handed to [`MessageStream`].
//!
//! # Architecture overview (for beginners)
//!
//! Edge Link connects "edge devices" to a central server.  A device logs in
//! over a reliable TCP *control channel*, uploads small datafiles of
//! integers, asks the server to compute over them, and can send files
//! directly to another logged-in device over UDP.
//!
//! - **`protocol`** – The control channel.  Every exchange is a [`Message`]:
//!   a flat map of string keys to string values, framed on the wire as an
//!   8-byte header followed by a bincode payload.
//!
//! - **`transfer`** – The datagram channel.  Files travel between devices as
//!   a sequence of [`Frame`]s (`FileInfo`, raw data, `Finished`, `ACK`) under
//!   a stop-and-wait discipline.
//!
//! - **`domain`** – Pure business rules: file identifiers and datafile
//!   naming, the four compute operations, and the active-device record that
//!   the server renders and the client parses.

pub mod domain;
pub mod protocol;
pub mod transfer;

// Re-export the most-used types at the crate root so callers can write
// `edge_core::Message` instead of `edge_core::protocol::message::Message`.
pub use domain::compute::{ComputeOperation, ComputeOverflow, ComputeResult};
pub use domain::datafile::{datafile_name, FileId, FileIdError};
pub use domain::device::{parse_listing, render_listing, ActiveDevice, DeviceParseError, NO_OTHER_DEVICES};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::message::{Command, Message, Status};
pub use protocol::stream::{ChannelError, MessageStream};
pub use transfer::frame::{Frame, FrameError, MAX_CHUNK_SIZE, MAX_DATAGRAM_SIZE};
