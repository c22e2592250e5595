//! Wire Frame Types
//!
//! Defines the JSON frames exchanged with the remote endpoint and the
//! shape check applied to every inbound message payload.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// A chat message as it travels over the wire
///
/// Used for both directions: the remote sends it as the payload of a
/// `MESSAGE` frame and the client sends it back the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFrame {
    /// Conversation this message belongs to
    pub chat_id: String,
    /// Unique message identifier
    pub message_id: String,
    /// Message body
    pub text: String,
    /// Identifier of the author
    pub sender_id: String,
    /// Display name of the author
    pub sender_name: String,
    /// Send time (RFC 3339)
    pub time: String,
}

/// Message received from the remote or another context
pub type InboundFrame = MessageFrame;

/// Message handed to the transport for sending
pub type OutboundFrame = MessageFrame;

impl MessageFrame {
    /// Compose a fresh message stamped with a new id and the current time
    pub fn compose(
        chat_id: impl Into<String>,
        text: impl Into<String>,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            time: Utc::now().to_rfc3339(),
        }
    }
}

/// An unchecked message payload
///
/// Every field is optional so that incomplete payloads still deserialize;
/// [`RawFrame::validate`] decides whether the payload is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFrame {
    pub chat_id: Option<Value>,
    pub message_id: Option<Value>,
    pub text: Option<Value>,
    pub sender_id: Option<Value>,
    pub sender_name: Option<Value>,
    pub time: Option<Value>,
}

/// Why a frame was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// A required field is absent, null, empty, zero or false
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A required field is present but not a string or number
    #[error("Field {0} must be a string or number")]
    InvalidField(&'static str),

    /// The frame is not valid JSON or has the wrong shape
    #[error("Malformed frame: {0}")]
    Malformed(String),
}

impl RawFrame {
    /// Names of the fields a message must carry, in wire spelling
    pub const REQUIRED_FIELDS: [&'static str; 6] =
        ["chatId", "messageId", "text", "senderId", "senderName", "time"];

    /// Check that all required fields are present and usable
    pub fn validate(self) -> Result<MessageFrame, FrameError> {
        Ok(MessageFrame {
            chat_id: required("chatId", self.chat_id)?,
            message_id: required("messageId", self.message_id)?,
            text: required("text", self.text)?,
            sender_id: required("senderId", self.sender_id)?,
            sender_name: required("senderName", self.sender_name)?,
            time: required("time", self.time)?,
        })
    }

    /// Parse an arbitrary JSON value into an unchecked frame
    pub fn from_value(value: Value) -> Result<Self, FrameError> {
        serde_json::from_value(value).map_err(|e| FrameError::Malformed(e.to_string()))
    }
}

impl From<MessageFrame> for RawFrame {
    fn from(frame: MessageFrame) -> Self {
        Self {
            chat_id: Some(Value::String(frame.chat_id)),
            message_id: Some(Value::String(frame.message_id)),
            text: Some(Value::String(frame.text)),
            sender_id: Some(Value::String(frame.sender_id)),
            sender_name: Some(Value::String(frame.sender_name)),
            time: Some(Value::String(frame.time)),
        }
    }
}

fn required(field: &'static str, value: Option<Value>) -> Result<String, FrameError> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Err(FrameError::MissingField(field)),
        Some(Value::String(s)) if s.is_empty() => Err(FrameError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(FrameError::MissingField(field)),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(FrameError::InvalidField(field)),
    }
}

/// Frames sent from the client to the remote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientFrame {
    /// Opaque token handshake, sent right after the socket opens
    Auth { token: String },
    /// An outgoing chat message
    Message { payload: OutboundFrame },
    /// Liveness check, answered with `PONG`
    Ping,
}

impl ClientFrame {
    /// Serialize to the JSON text sent over the socket
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frames received from the remote
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    /// A validated chat message
    Message(InboundFrame),
    /// The auth token was accepted
    AuthSuccess,
    /// The auth token was rejected
    AuthFailed { reason: Option<String> },
    /// Someone is typing
    Typing(Value),
    /// Presence change
    Presence(Value),
    /// Read receipt
    ReadReceipt(Value),
    /// Answer to `PING`
    Pong,
}

/// Parse and discriminate one inbound text frame
///
/// Returns `Ok(None)` for well-formed frames whose `type` is not one we
/// handle; those are dropped without error.
pub fn parse_server_frame(text: &str) -> Result<Option<ServerFrame>, FrameError> {
    let mut value: Value =
        serde_json::from_str(text).map_err(|e| FrameError::Malformed(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(FrameError::MissingField("type"))?
        .to_string();
    let payload = value
        .get_mut("payload")
        .map(Value::take)
        .unwrap_or(Value::Null);

    let frame = match kind.as_str() {
        "MESSAGE" => ServerFrame::Message(RawFrame::from_value(payload)?.validate()?),
        "AUTH_SUCCESS" => ServerFrame::AuthSuccess,
        "AUTH_FAILED" => ServerFrame::AuthFailed {
            reason: value
                .get("reason")
                .or_else(|| payload.get("reason"))
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        "TYPING" => ServerFrame::Typing(payload),
        "PRESENCE" => ServerFrame::Presence(payload),
        "READ_RECEIPT" => ServerFrame::ReadReceipt(payload),
        "PONG" => ServerFrame::Pong,
        _ => return Ok(None),
    };

    Ok(Some(frame))
}
