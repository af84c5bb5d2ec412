//! Datagram channel for device-to-device file transfer.
//!
//! # How a transfer works (for beginners)
//!
//! UDP delivers whole datagrams but may drop or reorder them.  Edge Link
//! keeps things simple with *stop-and-wait*: the sender has at most one
//! unacknowledged datagram outstanding, and waits for the receiver's `ACK`
//! before sending the next one.
//!
//! ```text
//! sender                         receiver
//!   │── FileInfo alice notes.txt ─▶│  open alice_notes.txt
//!   │◀──────────── ACK ────────────│
//!   │── <up to 1024 raw bytes> ───▶│  append
//!   │◀──────────── ACK ────────────│
//!   │            …                 │
//!   │── Finished ─────────────────▶│  close, notify
//! ```
//!
//! There is no retransmission timer.  A lost datagram stalls the transfer
//! until the process exits.
//!
//! This module only defines the frame format.  The sockets live in the
//! client crate.

pub mod frame;

pub use frame::{Frame, FrameError, MAX_CHUNK_SIZE, MAX_DATAGRAM_SIZE};
