//! Low-level wire types and constants.
//!
//! This module defines:
//! - Event names shared by both encodings.
//! - [`ClientFrame`], the decoded form of one client line.
//! - Serde shapes for the JSON encoding.
//! - Timestamp formatting and identifier validation helpers.
//!
//! The actual encode/decode logic lives in `json_codec` and `text_codec`.

use chat_core::InputEvent;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Client → server event names.
pub const EVENT_JOIN: &str = "join";
pub const EVENT_SEND_MESSAGE: &str = "sendMessage";
pub const EVENT_AUTHENTICATE: &str = "authenticate";

/// Server → client event names.
pub const EVENT_USER_STATUS: &str = "userStatus";
pub const EVENT_RECEIVE_MESSAGE: &str = "receiveMessage";
pub const EVENT_ERROR: &str = "error";

/// Default cap for one line, newline excluded.
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

/// One decoded client line.
///
/// `Authenticate` never reaches the hub as an event; the transport layer
/// verifies the token and binds the resulting principal itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    Authenticate { token: String },
    Event(InputEvent),
}

// -----------------------------------------------------------------------------
// JSON shapes
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub(crate) enum WireClientFrame {
    Join(String),
    SendMessage(WireSendMessage),
    Authenticate(WireAuthenticate),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireSendMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireAuthenticate {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub(crate) enum WireServerFrame {
    UserStatus(Vec<String>),
    ReceiveMessage(WireReceiveMessage),
    Error(WireError),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireReceiveMessage {
    pub sender_id: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireError {
    pub message: String,
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// RFC 3339, millisecond precision, `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ProtocolError> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| ProtocolError::InvalidTimestamp(s.to_string()))
}

/// Identifiers and tokens must be non-empty.
pub fn require_non_empty(field: &'static str, value: String) -> Result<String, ProtocolError> {
    if value.trim().is_empty() {
        Err(ProtocolError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// User identifiers must be non-empty and free of commas and line breaks,
/// so both encodings can carry them verbatim.
pub fn require_identifier(field: &'static str, value: String) -> Result<String, ProtocolError> {
    let value = require_non_empty(field, value)?;
    if value.contains([',', '\n', '\r']) {
        Err(ProtocolError::InvalidField(field))
    } else {
        Ok(value)
    }
}
