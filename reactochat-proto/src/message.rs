//! Chat message schema (§6 WIRE PROTOCOL)
//!
//! Every wire message is a flat JSON object tagged by `type`. `content` is
//! an opaque string: for text messages it is whatever the sender put there
//! (plain text for a username-registration message, base64 for a relayed
//! chat line); for file messages it is always base64. This crate never
//! forces a decode on a field it didn't ask for — callers use
//! [`encode_content`]/[`decode_content`] at the point they need bytes.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Discriminates the two halves of a file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileMsgType {
    /// Filename announcement, sent before the data chunk.
    Metadata,
    /// Base64-encoded file bytes.
    Data,
}

/// One chat-room wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatMessage {
    /// A text line, or (when `sender == "client"`) a username announcement.
    Text {
        /// `"client"` on registration, `"server"` on outbound, or the
        /// sender's stored username once relayed.
        sender: String,
        /// `"server"` inbound, `"client"` outbound. Absent on some
        /// malformed inputs, hence optional.
        #[serde(skip_serializing_if = "Option::is_none")]
        recipient: Option<String>,
        /// Decimal milliseconds since Unix epoch.
        timestamp: String,
        /// Plain text (registration) or base64 (chat content).
        content: String,
    },
    /// One half of a file transfer.
    File {
        /// Username of the uploader, or the rewritten-on-relay sender.
        sender: String,
        /// Decimal milliseconds since Unix epoch.
        timestamp: String,
        /// Which half of the transfer this object is.
        msg_type: FileMsgType,
        /// Filename (`Metadata`) or base64 file bytes (`Data`).
        content: String,
    },
}

impl ChatMessage {
    /// The `sender` field, common to both variants.
    #[must_use]
    pub fn sender(&self) -> &str {
        match self {
            Self::Text { sender, .. } | Self::File { sender, .. } => sender,
        }
    }

    /// Replace the `sender` field in place, used when the worker rewrites an
    /// anonymous client's message to carry its registered username.
    pub fn set_sender(&mut self, new_sender: String) {
        match self {
            Self::Text { sender, .. } | Self::File { sender, .. } => *sender = new_sender,
        }
    }

    /// Parse one bracket-delimited JSON slice into a [`ChatMessage`].
    ///
    /// `type`/`msg_type` are checked against the known set before handing
    /// off to the derive-based deserializer, so an unrecognized tag is
    /// reported as [`ProtocolError::UnknownType`]/[`ProtocolError::UnknownMsgType`]
    /// rather than collapsing into the generic [`ProtocolError::Parse`].
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;

        match value.get("type").and_then(serde_json::Value::as_str) {
            Some("text") => {}
            Some("file") => {
                let msg_type = value.get("msg_type").and_then(serde_json::Value::as_str);
                if !matches!(msg_type, Some("metadata") | Some("data")) {
                    return Err(ProtocolError::UnknownMsgType(
                        msg_type.unwrap_or("<missing>").to_string(),
                    ));
                }
            }
            other => {
                return Err(ProtocolError::UnknownType(
                    other.unwrap_or("<missing>").to_string(),
                ));
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Serialize back to a compact JSON object, matching the wire format.
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("ChatMessage fields are always serializable")
    }
}

/// Current time as decimal milliseconds since the Unix epoch, matching the
/// reference `G_TIMESTAMP` macro.
#[must_use]
pub fn timestamp_ms() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_millis().to_string()
}

/// Base64-encode raw bytes for a `content` field.
#[must_use]
pub fn encode_content(raw: &[u8]) -> String {
    BASE64.encode(raw)
}

/// Decode a base64 `content` field back to raw bytes.
pub fn decode_content(content: &str) -> Result<Vec<u8>, ProtocolError> {
    Ok(BASE64.decode(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_message_round_trips() {
        let raw = br#"{"type":"text","sender":"client","recipient":"server","timestamp":"1","content":"alice"}"#;
        let msg = ChatMessage::parse(raw).unwrap();
        assert_eq!(msg.sender(), "client");
        match &msg {
            ChatMessage::Text { content, .. } => assert_eq!(content, "alice"),
            ChatMessage::File { .. } => panic!("expected text"),
        }
    }

    #[test]
    fn set_sender_rewrites_in_place() {
        let mut msg = ChatMessage::Text {
            sender: "client".into(),
            recipient: Some("server".into()),
            timestamp: "2".into(),
            content: "SGk=".into(),
        };
        msg.set_sender("alice".into());
        assert_eq!(msg.sender(), "alice");
    }

    #[test]
    fn file_message_round_trips() {
        let raw = br#"{"type":"file","sender":"alice","timestamp":"3","msg_type":"metadata","content":"photo.png"}"#;
        let msg = ChatMessage::parse(raw).unwrap();
        assert!(matches!(
            msg,
            ChatMessage::File {
                msg_type: FileMsgType::Metadata,
                ..
            }
        ));
    }

    #[test]
    fn content_base64_round_trips() {
        let encoded = encode_content(b"Hi");
        assert_eq!(encoded, "SGk=");
        assert_eq!(decode_content(&encoded).unwrap(), b"Hi");
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let raw = br#"{"type":"ping","sender":"x"}"#;
        assert!(matches!(
            ChatMessage::parse(raw),
            Err(ProtocolError::UnknownType(t)) if t == "ping"
        ));
    }

    #[test]
    fn unknown_file_msg_type_is_a_discriminated_error() {
        let raw = br#"{"type":"file","sender":"alice","timestamp":"1","msg_type":"ack","content":""}"#;
        assert!(matches!(
            ChatMessage::parse(raw),
            Err(ProtocolError::UnknownMsgType(t)) if t == "ack"
        ));
    }
}
