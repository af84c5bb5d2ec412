//! Peer-to-peer file transfer over UDP.
//!
//! # Stop-and-wait (for beginners)
//!
//! UDP may drop or reorder datagrams.  To keep the receiver's file in
//! order, the sender keeps exactly one frame in flight and waits for the
//! receiver's `ACK` before sending the next:
//!
//! ```text
//! sender                          receiver
//!   │── FileInfo alice notes.txt ─▶│  open alice_notes.txt
//!   │◀──────────── ACK ────────────│
//!   │── <chunk 1> ────────────────▶│  append
//!   │◀──────────── ACK ────────────│
//!   │── Finished ─────────────────▶│  close, report
//! ```
//!
//! One UDP socket per process serves both roles.  The standing receiver
//! task reads every datagram; when it sees an `ACK` it wakes the sender
//! through the shared [`AckSlot`](ack::AckSlot).
//!
//! Nothing retransmits.  A lost frame or ACK stalls that transfer forever.

pub mod ack;
pub mod receiver;
pub mod sender;

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use self::ack::AckSlot;
use self::receiver::run_receiver;
use self::sender::UdpFileSender;

/// Capacity of the progress-event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Errors from the datagram endpoint.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The UDP socket could not be bound.
    #[error("failed to bind datagram socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// Reading the source file or sending a datagram failed.
    #[error("transfer I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Progress of a transfer, for display to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// An outbound transfer began.
    Started { filename: String, device: String },
    /// An outbound transfer finished.
    Sent { filename: String, device: String },
    /// An outbound transfer failed locally.
    Failed { filename: String, reason: String },
    /// An inbound transfer finished.
    Received { filename: String, sender: String },
}

impl fmt::Display for TransferEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferEvent::Started { filename, device } => {
                write!(f, "UVF: Sending {filename} to {device}...")
            }
            TransferEvent::Sent { filename, device } => {
                write!(f, "UVF: {filename} has been uploaded to {device}.")
            }
            TransferEvent::Failed { filename, reason } => {
                write!(f, "UVF: ERROR - Failed to send {filename}: {reason}")
            }
            TransferEvent::Received { filename, sender } => {
                write!(f, "UVF: Received {filename} from {sender}.")
            }
        }
    }
}

/// A bound UDP endpoint with its receiver task running.
pub struct DatagramEndpoint {
    socket: Arc<UdpSocket>,
    ack: Arc<AckSlot>,
    /// Held by whichever outbound transfer is in progress.
    outbound: Arc<Mutex<()>>,
    events: mpsc::Sender<TransferEvent>,
    receiver: JoinHandle<()>,
}

impl DatagramEndpoint {
    /// Binds `addr` and starts the standing receiver, which writes inbound
    /// files into `work_dir`.
    ///
    /// Returns the endpoint and the stream of progress events from both
    /// directions.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Bind`] if the socket cannot be bound.
    pub async fn bind(
        addr: SocketAddr,
        work_dir: PathBuf,
    ) -> Result<(Self, mpsc::Receiver<TransferEvent>), TransferError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| TransferError::Bind { addr, source })?;
        let socket = Arc::new(socket);
        let ack = Arc::new(AckSlot::new());
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let receiver = tokio::spawn(run_receiver(
            Arc::clone(&socket),
            Arc::clone(&ack),
            work_dir,
            tx.clone(),
        ));
        if let Ok(local) = socket.local_addr() {
            info!("datagram endpoint listening on UDP {local}");
        }

        Ok((
            Self {
                socket,
                ack,
                outbound: Arc::new(Mutex::new(())),
                events: tx,
                receiver,
            },
            rx,
        ))
    }

    /// The address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Propagates the OS error if the address cannot be read.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// A sender that identifies itself to peers as `username`.
    pub fn sender(&self, username: impl Into<String>) -> UdpFileSender {
        UdpFileSender::new(
            Arc::clone(&self.socket),
            Arc::clone(&self.ack),
            Arc::clone(&self.outbound),
            username.into(),
            self.events.clone(),
        )
    }
}

impl Drop for DatagramEndpoint {
    fn drop(&mut self) {
        self.receiver.abort();
    }
}
