//! Binary codec for control-channel messages.
//!
//! Wire format:
//! ```text
//! [version:1][reserved:3][payload_len:4][payload:N]
//! ```
//! Total header size: 8 bytes.  `payload_len` is big-endian.  The payload is
//! the bincode encoding of the message's field map, so field values survive
//! verbatim, embedded newlines included.

use bincode::Options;
use thiserror::Error;

use crate::protocol::message::Message;

/// Current protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Upper bound on a single payload.  Datafiles are small; anything larger is
/// treated as a corrupt length field rather than allocated.
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The protocol version in the header is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The declared payload length exceeds [`MAX_PAYLOAD_LEN`].
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// The encoded payload length field does not match the actual data available.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },

    /// The payload could not be parsed as a field map.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`Message`] into a byte vector including the 8-byte header.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] if the serialized fields exceed
/// [`MAX_PAYLOAD_LEN`].
///
/// # Examples
///
/// ```rust
/// use edge_core::protocol::{decode_message, encode_message};
/// use edge_core::protocol::message::{fields, Command, Message};
///
/// let msg = Message::new(Command::UploadData).with(fields::CONTENT, "1\n2\n3\n");
/// let bytes = encode_message(&msg).unwrap();
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    let size = wire_options()
        .serialized_size(msg)
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))? as usize;
    if size > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge(size));
    }
    let payload = wire_options()
        .serialize(msg)
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.push(PROTOCOL_VERSION);
    buf.extend_from_slice(&[0x00; 3]); // reserved
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decodes one [`Message`] from the beginning of `bytes`.
///
/// Returns the decoded message and the total number of bytes consumed
/// (header + payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are malformed or incomplete.
pub fn decode_message(bytes: &[u8]) -> Result<(Message, usize), ProtocolError> {
    let payload_len = decode_header(bytes)?;

    let total_needed = HEADER_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: payload_len,
            available: bytes.len() - HEADER_SIZE,
        });
    }

    let msg = decode_payload(&bytes[HEADER_SIZE..total_needed])?;
    Ok((msg, total_needed))
}

/// Validates a header and returns the payload length it declares.
///
/// # Errors
///
/// Returns [`ProtocolError`] for a short header, an unknown version, or an
/// oversized length.
pub fn decode_header(bytes: &[u8]) -> Result<usize, ProtocolError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let version = bytes[0];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    // bytes[1..4] are reserved – ignored on decode

    let payload_len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge(payload_len));
    }
    Ok(payload_len)
}

/// Decodes a payload (without header) into a [`Message`].
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if the bytes are not a valid
/// field map or contain trailing garbage.
pub fn decode_payload(payload: &[u8]) -> Result<Message, ProtocolError> {
    wire_options()
        .deserialize(payload)
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))
}

/// Fixed-width little-endian integers, no trailing bytes.
fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{fields, Command, Status};

    fn round_trip(msg: &Message) -> Message {
        let encoded = encode_message(msg).expect("encode failed");
        let (decoded, consumed) = decode_message(&encoded).expect("decode failed");
        assert_eq!(consumed, encoded.len(), "consumed bytes should equal total encoded size");
        decoded
    }

    #[test]
    fn test_upload_with_multiline_content_survives_verbatim() {
        let content = "12\n-7\n\n9999\r\n  42  \n";
        let msg = Message::new(Command::UploadData)
            .with(fields::FILE_ID, "3")
            .with(fields::CONTENT, content);
        let decoded = round_trip(&msg);
        assert_eq!(decoded.get(fields::CONTENT), Some(content));
    }

    #[test]
    fn test_unicode_and_empty_values_survive() {
        let msg = Message::reply(Command::Login, Status::Prompt)
            .with(fields::PROMPT, "Mot de passe : ")
            .with(fields::CONTENT, "");
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode_message(&Message::new(Command::Logout)).unwrap();
        assert_eq!(bytes[0], PROTOCOL_VERSION);
        assert_eq!(&bytes[1..4], &[0, 0, 0]);
        let declared = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        assert_eq!(declared, bytes.len() - HEADER_SIZE);
    }

    #[test]
    fn test_two_messages_back_to_back_decode_in_order() {
        let first = Message::new(Command::ActiveDevices);
        let second = Message::new(Command::Logout);
        let mut stream = encode_message(&first).unwrap();
        stream.extend(encode_message(&second).unwrap());

        let (a, n) = decode_message(&stream).unwrap();
        let (b, m) = decode_message(&stream[n..]).unwrap();
        assert_eq!(a, first);
        assert_eq!(b, second);
        assert_eq!(n + m, stream.len());
    }

    #[test]
    fn test_decode_short_header_is_insufficient_data() {
        let err = decode_message(&[PROTOCOL_VERSION, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InsufficientData {
                needed: HEADER_SIZE,
                available: 3
            }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let mut bytes = encode_message(&Message::new(Command::Logout)).unwrap();
        bytes[0] = 0x7F;
        assert_eq!(
            decode_message(&bytes).unwrap_err(),
            ProtocolError::UnsupportedVersion(0x7F)
        );
    }

    #[test]
    fn test_decode_truncated_payload_is_length_mismatch() {
        let bytes = encode_message(&Message::new(Command::Logout)).unwrap();
        let truncated = &bytes[..bytes.len() - 1];
        assert!(matches!(
            decode_message(truncated),
            Err(ProtocolError::PayloadLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_length_field() {
        let mut bytes = vec![PROTOCOL_VERSION, 0, 0, 0];
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        assert_eq!(
            decode_message(&bytes).unwrap_err(),
            ProtocolError::PayloadTooLarge(u32::MAX as usize)
        );
    }

    #[test]
    fn test_decode_payload_rejects_garbage() {
        // A map length of 1 followed by a string length far past the end.
        let garbage = [1u8, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            decode_payload(&garbage),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_payload_rejects_trailing_bytes() {
        let mut payload = wire_options().serialize(&Message::new(Command::Logout)).unwrap();
        payload.push(0xAA);
        assert!(matches!(
            decode_payload(&payload),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }
}
