//! Message types used by the chat core.
//!
//! These are **transport-agnostic** logical messages:
//! - [`InputEvent`]: what a client asks the hub to do.
//! - [`OutputEvent`]: what the hub pushes back to clients.
//! - [`Delivery`]: an output event addressed to one connection.
//!
//! JSON / text encoders live in the `chat-protocol` crate;
//! this module is purely logical.

use chrono::{DateTime, Utc};

use crate::connection::ConnectionId;

/// A request from a connected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Register presence under `user_id`.
    Join { user_id: String },

    /// Ask the relay to forward a chat message.
    SendMessage(SendMessage),
}

/// An event pushed to a connected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// Current online-user set, in directory order.
    UserStatus(Vec<String>),

    /// A relayed chat message.
    ReceiveMessage(ReceiveMessage),

    /// The client's last frame or event was rejected.
    Error(String),
}

/// `sendMessage` payload (input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
}

/// `receiveMessage` payload (output).
///
/// The receiver id is implied by the connection it is delivered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveMessage {
    pub sender_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Transient chat message; lives for the duration of one relay call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Stamp a `sendMessage` request with the relay time.
    pub fn from_request(req: SendMessage, timestamp: DateTime<Utc>) -> Self {
        ChatMessage {
            sender_id: req.sender_id,
            receiver_id: req.receiver_id,
            content: req.content,
            timestamp,
        }
    }

    /// The payload the receiver sees.
    pub fn into_receive(self) -> ReceiveMessage {
        ReceiveMessage {
            sender_id: self.sender_id,
            content: self.content,
            timestamp: self.timestamp,
        }
    }
}

/// One output event addressed to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub to: ConnectionId,
    pub event: OutputEvent,
}

// -----------------------------------------------------------------------------
// Convenience constructors
// -----------------------------------------------------------------------------

impl InputEvent {
    pub fn join(user_id: impl Into<String>) -> Self {
        InputEvent::Join {
            user_id: user_id.into(),
        }
    }

    pub fn send_message(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        InputEvent::SendMessage(SendMessage {
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            content: content.into(),
        })
    }
}

impl OutputEvent {
    pub fn error(message: impl Into<String>) -> Self {
        OutputEvent::Error(message.into())
    }
}

impl Delivery {
    pub fn new(to: ConnectionId, event: OutputEvent) -> Self {
        Delivery { to, event }
    }
}
