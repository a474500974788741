//! Wire protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding a single framed object. These are
/// always non-fatal: the caller logs and drops the one offending object,
/// matching the reference worker's per-message `catch`.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The extracted bracket range was not valid JSON.
    #[error("malformed JSON object: {0}")]
    Parse(#[from] serde_json::Error),

    /// `type` was present but not `"text"` or `"file"`.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// A file message's `msg_type` was present but not `"metadata"` or
    /// `"data"`.
    #[error("unknown file msg_type: {0}")]
    UnknownMsgType(String),

    /// `content` could not be decoded as base64.
    #[error("invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),
}
