//! Reactochat Protocol
//!
//! Wire-level concerns for the chat room: the bracket-balanced object
//! framer and the text/file message schema. Knows nothing about sockets,
//! threads, or the reactor.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod framer;
pub mod message;

/// Common imports for consumers of this crate.
pub mod prelude {
    pub use crate::error::ProtocolError;
    pub use crate::framer::extract_objects;
    pub use crate::message::{decode_content, encode_content, timestamp_ms, ChatMessage, FileMsgType};
}
