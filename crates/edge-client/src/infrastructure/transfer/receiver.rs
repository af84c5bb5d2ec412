//! Inbound side of the stop-and-wait transfer.
//!
//! The receiver is the only reader of the process's UDP socket.  It writes
//! inbound files and acknowledges each frame, and it forwards `ACK` frames
//! meant for this process's own sender to the [`AckSlot`].
//!
//! Only one inbound transfer is tracked at a time.  A `FileInfo` that
//! arrives while another file is open replaces it.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use edge_core::{Frame, MAX_DATAGRAM_SIZE};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::ack::AckSlot;
use super::TransferEvent;

/// The file currently being received.
struct Inbound {
    file: File,
    filename: String,
    sender: String,
}

/// Receives datagrams until the task is aborted.
pub async fn run_receiver(
    socket: Arc<UdpSocket>,
    ack: Arc<AckSlot>,
    work_dir: PathBuf,
    events: mpsc::Sender<TransferEvent>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut current: Option<Inbound> = None;

    loop {
        let (len, src) = match socket.recv_from(&mut buf).await {
            Ok(pair) => pair,
            Err(e) => {
                // Some platforms surface ICMP port-unreachable from an
                // earlier send here; the socket is still usable.
                debug!("datagram recv error: {e}");
                continue;
            }
        };

        let frame = match Frame::decode(&buf[..len]) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%src, "discarding malformed frame: {e}");
                continue;
            }
        };

        match frame {
            Frame::Ack => ack.release(),
            Frame::FileInfo { sender, filename } => {
                let Some(dest) = destination_name(&sender, &filename) else {
                    warn!(%src, sender = %sender, filename = %filename, "refusing unusable file name");
                    continue;
                };
                match File::create(work_dir.join(&dest)).await {
                    Ok(file) => {
                        info!(%src, file = %dest, "receiving file");
                        current = Some(Inbound {
                            file,
                            filename: dest,
                            sender,
                        });
                        send_ack(&socket, src).await;
                    }
                    Err(e) => error!(file = %dest, "cannot create received file: {e}"),
                }
            }
            Frame::Data(bytes) => match current.as_mut() {
                Some(inbound) => match inbound.file.write_all(&bytes).await {
                    Ok(()) => send_ack(&socket, src).await,
                    Err(e) => error!(file = %inbound.filename, "write failed: {e}"),
                },
                None => debug!(%src, len = bytes.len(), "data frame with no open transfer"),
            },
            Frame::Finished => {
                let Some(mut inbound) = current.take() else {
                    debug!(%src, "Finished with no open transfer");
                    continue;
                };
                if let Err(e) = inbound.file.flush().await {
                    error!(file = %inbound.filename, "flush failed: {e}");
                }
                info!(file = %inbound.filename, sender = %inbound.sender, "file received");
                let event = TransferEvent::Received {
                    filename: inbound.filename,
                    sender: inbound.sender,
                };
                if events.send(event).await.is_err() {
                    debug!("transfer event dropped: no listener");
                }
            }
        }
    }
}

async fn send_ack(socket: &UdpSocket, dest: SocketAddr) {
    if let Err(e) = socket.send_to(&Frame::Ack.encode(), dest).await {
        warn!("failed to send ACK to {dest}: {e}");
    }
}

/// `{sender}_{filename}`, using only the final path component of each so
/// the result always lands inside the work directory.
fn destination_name(sender: &str, filename: &str) -> Option<String> {
    let base = |s: &str| {
        Path::new(s)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    };
    Some(format!("{}_{}", base(sender)?, base(filename)?))
}
