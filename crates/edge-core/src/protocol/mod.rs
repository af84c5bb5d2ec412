//! Protocol module containing the message envelope, the binary codec, and the
//! async stream wrapper used by both ends of the control channel.

pub mod codec;
pub mod message;
pub mod stream;

pub use codec::{decode_message, encode_message, ProtocolError};
pub use message::*;
pub use stream::{ChannelError, MessageStream};
