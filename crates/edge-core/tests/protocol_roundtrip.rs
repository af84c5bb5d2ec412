//! Integration tests for the edge-core public API.
//!
//! These drive a realistic login-then-command exchange through
//! `MessageStream` over an in-memory pipe, and check that the listing and
//! frame helpers agree with what the server and client expect of each other.

use edge_core::protocol::message::fields;
use edge_core::{
    parse_listing, render_listing, ActiveDevice, ChannelError, Command, ComputeOperation, FileId,
    Frame, Message, MessageStream, Status,
};

#[tokio::test]
async fn test_prompt_reply_exchange_preserves_order() {
    // Arrange
    let (a, b) = tokio::io::duplex(4096);
    let mut client = MessageStream::new(a);
    let mut server = MessageStream::new(b);

    let server_task = tokio::spawn(async move {
        server
            .send(&Message::reply(Command::Login, Status::Prompt).with(fields::PROMPT, "Username: "))
            .await
            .unwrap();
        let name = server.recv().await.unwrap();
        server
            .send(&Message::reply(Command::Login, Status::Prompt).with(fields::PROMPT, "Password: "))
            .await
            .unwrap();
        let password = server.recv().await.unwrap();
        (
            name.get(fields::CONTENT).map(str::to_string),
            password.get(fields::CONTENT).map(str::to_string),
        )
    });

    // Act
    let first = client.recv().await.unwrap();
    client
        .send(&Message::new(Command::Login).with(fields::CONTENT, "alice"))
        .await
        .unwrap();
    let second = client.recv().await.unwrap();
    client
        .send(&Message::new(Command::Login).with(fields::CONTENT, "secret"))
        .await
        .unwrap();
    let (name, password) = server_task.await.unwrap();

    // Assert
    assert_eq!(first.get(fields::PROMPT), Some("Username: "));
    assert_eq!(second.get(fields::PROMPT), Some("Password: "));
    assert_eq!(name.as_deref(), Some("alice"));
    assert_eq!(password.as_deref(), Some("secret"));
}

#[tokio::test]
async fn test_peer_hangup_mid_session_is_a_disconnect() {
    let (a, b) = tokio::io::duplex(256);
    let mut server = MessageStream::new(b);
    {
        let mut client = MessageStream::new(a);
        client.send(&Message::new(Command::ActiveDevices)).await.unwrap();
    }

    let first = server.recv().await.unwrap();
    assert_eq!(first.command(), Some(Command::ActiveDevices));
    let err = server.recv().await.unwrap_err();
    assert!(matches!(err, ChannelError::Closed));
    assert!(err.is_disconnect());
}

#[test]
fn test_listing_feeds_peer_lookup() {
    let devices = vec![
        ActiveDevice {
            username: "Supersmartwatch".into(),
            active_from: "05 October 2022 14:03:11".into(),
            ip: "127.0.0.1".into(),
            udp_port: 6001,
        },
        ActiveDevice {
            username: "temperaturesensor".into(),
            active_from: "05 October 2022 14:05:42".into(),
            ip: "127.0.0.1".into(),
            udp_port: 6002,
        },
    ];

    let parsed = parse_listing(&render_listing(&devices));
    let peer = parsed.iter().find(|d| d.username == "temperaturesensor").unwrap();

    assert_eq!(peer.udp_port, 6002);
}

#[test]
fn test_request_fields_parse_into_domain_types() {
    let request = Message::new(Command::Compute)
        .with(fields::FILE_ID, "4")
        .with(fields::OPERATION, "MAX");

    let id: FileId = request.get(fields::FILE_ID).unwrap().parse().unwrap();
    let op: ComputeOperation = request.get(fields::OPERATION).unwrap().parse().unwrap();

    assert_eq!(id.get(), 4);
    assert_eq!(op.apply(&[3, 9, 1]).unwrap().to_string(), "9");
}

#[test]
fn test_transfer_frames_in_sequence() {
    let sequence = [
        Frame::FileInfo {
            sender: "alice".into(),
            filename: "alice-1.txt".into(),
        },
        Frame::Data(b"12\n34\n".to_vec()),
        Frame::Finished,
    ];
    for frame in &sequence {
        assert_eq!(&Frame::decode(&frame.encode()).unwrap(), frame);
    }
}
