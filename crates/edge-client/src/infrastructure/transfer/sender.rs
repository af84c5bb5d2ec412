//! Outbound side of the stop-and-wait transfer.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use edge_core::{Frame, MAX_CHUNK_SIZE};
use tokio::io::AsyncReadExt;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use super::ack::AckSlot;
use super::{TransferError, TransferEvent};
use crate::application::executor::FileSender;

/// Sends files to peers from the process's shared UDP socket.
///
/// Transfers started while another is running queue behind it: the ACK
/// slot and the peer's receiver both track a single stream.
#[derive(Clone)]
pub struct UdpFileSender {
    socket: Arc<UdpSocket>,
    ack: Arc<AckSlot>,
    outbound: Arc<Mutex<()>>,
    username: String,
    events: mpsc::Sender<TransferEvent>,
}

impl UdpFileSender {
    pub(crate) fn new(
        socket: Arc<UdpSocket>,
        ack: Arc<AckSlot>,
        outbound: Arc<Mutex<()>>,
        username: String,
        events: mpsc::Sender<TransferEvent>,
    ) -> Self {
        Self {
            socket,
            ack,
            outbound,
            username,
            events,
        }
    }

    /// Sends the file at `path` to `peer` and returns once `Finished` has
    /// been sent.
    ///
    /// Returns the number of data frames sent.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Io`] if the file cannot be read or a datagram
    /// cannot be sent.
    pub async fn transfer_file(&self, peer: SocketAddr, path: &Path) -> Result<usize, TransferError> {
        let _turn = self.outbound.lock().await;
        let filename = file_name(path);
        let mut file = tokio::fs::File::open(path).await?;

        self.send_and_wait(
            peer,
            &Frame::FileInfo {
                sender: self.username.clone(),
                filename: filename.clone(),
            },
        )
        .await?;

        let mut chunk = vec![0u8; MAX_CHUNK_SIZE];
        let mut frames = 0;
        loop {
            let n = file.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            self.send_and_wait(peer, &Frame::Data(chunk[..n].to_vec()))
                .await?;
            frames += 1;
        }

        self.socket.send_to(&Frame::Finished.encode(), peer).await?;
        info!(file = %filename, %peer, frames, "transfer complete");
        Ok(frames)
    }

    async fn send_and_wait(&self, peer: SocketAddr, frame: &Frame) -> Result<(), TransferError> {
        self.ack.reset();
        self.socket.send_to(&frame.encode(), peer).await?;
        debug!(%peer, "frame sent; waiting for ACK");
        self.ack.wait().await;
        Ok(())
    }

    async fn emit(&self, event: TransferEvent) {
        if self.events.send(event).await.is_err() {
            debug!("transfer event dropped: no listener");
        }
    }
}

impl FileSender for UdpFileSender {
    fn start_transfer(&self, device: String, addr: SocketAddr, path: PathBuf) {
        let this = self.clone();
        tokio::spawn(async move {
            let filename = file_name(&path);
            this.emit(TransferEvent::Started {
                filename: filename.clone(),
                device: device.clone(),
            })
            .await;
            match this.transfer_file(addr, &path).await {
                Ok(_) => this.emit(TransferEvent::Sent { filename, device }).await,
                Err(e) => {
                    warn!(file = %filename, peer = %addr, "transfer failed: {e}");
                    this.emit(TransferEvent::Failed {
                        filename,
                        reason: e.to_string(),
                    })
                    .await;
                }
            }
        });
    }
}

/// The final path component, as announced to the peer.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn fake_peer() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    async fn make_sender() -> (UdpFileSender, Arc<UdpSocket>, mpsc::Receiver<TransferEvent>) {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let (tx, rx) = mpsc::channel(8);
        let sender = UdpFileSender::new(
            Arc::clone(&socket),
            Arc::new(AckSlot::new()),
            Arc::new(Mutex::new(())),
            "alice".to_string(),
            tx,
        );
        (sender, socket, rx)
    }

    async fn recv_frame(peer: &UdpSocket) -> (Frame, SocketAddr) {
        let mut buf = vec![0u8; 2048];
        let (n, from) = tokio::time::timeout(Duration::from_secs(2), peer.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        (Frame::decode(&buf[..n]).unwrap(), from)
    }

    #[tokio::test]
    async fn test_sender_waits_for_each_ack() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "abc").unwrap();
        let (peer, peer_addr) = fake_peer().await;
        let (sender, _socket, _events) = make_sender().await;
        let ack = Arc::clone(&sender.ack);
        let task = {
            let sender = sender.clone();
            tokio::spawn(async move { sender.transfer_file(peer_addr, &path).await })
        };

        // Act / Assert – nothing follows FileInfo until it is acknowledged.
        let (first, _) = recv_frame(&peer).await;
        assert_eq!(
            first,
            Frame::FileInfo {
                sender: "alice".to_string(),
                filename: "notes.txt".to_string()
            }
        );
        let mut buf = [0u8; 16];
        let early = tokio::time::timeout(Duration::from_millis(100), peer.recv_from(&mut buf)).await;
        assert!(early.is_err());
        assert!(!task.is_finished());

        // The receiver task would normally do this on an incoming ACK.
        ack.release();
        let (data, _) = recv_frame(&peer).await;
        assert_eq!(data, Frame::Data(b"abc".to_vec()));

        ack.release();
        let (last, _) = recv_frame(&peer).await;
        assert_eq!(last, Frame::Finished);
        assert_eq!(task.await.unwrap().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_large_file_is_split_into_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let body: Vec<u8> = (0..2500u32).map(|i| b'a' + (i % 26) as u8).collect();
        std::fs::write(&path, &body).unwrap();
        let (peer, peer_addr) = fake_peer().await;
        let (sender, _socket, _events) = make_sender().await;
        let ack = Arc::clone(&sender.ack);
        let task = tokio::spawn(async move { sender.transfer_file(peer_addr, &path).await });

        let mut received = Vec::new();
        let mut sizes = Vec::new();
        loop {
            let (frame, _) = recv_frame(&peer).await;
            match frame {
                Frame::FileInfo { .. } => {}
                Frame::Data(bytes) => {
                    sizes.push(bytes.len());
                    received.extend(bytes);
                }
                Frame::Finished => break,
                Frame::Ack => panic!("sender never sends ACK"),
            }
            ack.release();
        }

        assert_eq!(received, body);
        assert_eq!(sizes, vec![1024, 1024, 452]);
        assert_eq!(task.await.unwrap().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_missing_file_reports_failure_event() {
        let dir = tempfile::tempdir().unwrap();
        let (_peer, peer_addr) = fake_peer().await;
        let (sender, _socket, mut events) = make_sender().await;

        sender.start_transfer("bob".to_string(), peer_addr, dir.path().join("gone.txt"));

        assert_eq!(
            events.recv().await.unwrap(),
            TransferEvent::Started {
                filename: "gone.txt".to_string(),
                device: "bob".to_string()
            }
        );
        assert!(matches!(
            events.recv().await.unwrap(),
            TransferEvent::Failed { filename, .. } if filename == "gone.txt"
        ));
    }
}
