//! Shared types for the chat TCP server.
//!
//! This module defines:
//! - channel aliases between connection tasks and the hub loop
//! - `HubRequest`: messages flowing from connection tasks to the hub

use chat_core::{ConnectionId, InputEvent, OutputEvent};
use tokio::sync::mpsc;

/// Outbound events from the hub (or the connection's own reader) to one
/// client writer.
pub type OutboundTx = mpsc::UnboundedSender<OutputEvent>;
pub type OutboundRx = mpsc::UnboundedReceiver<OutputEvent>;

/// Message flowing from a connection task into the central hub task.
#[derive(Debug)]
pub enum HubRequest {
    /// Transport accepted; the connection is now `Connected` and
    /// receives broadcasts through `tx`.
    Connect { conn: ConnectionId, tx: OutboundTx },

    /// The connection presented a valid token for `principal`.
    Authenticated { conn: ConnectionId, principal: String },

    /// A decoded client event.
    Event { conn: ConnectionId, event: InputEvent },

    /// Transport closed.
    Disconnect { conn: ConnectionId },
}

/// Channel from connection tasks → hub task.
pub type HubTx = mpsc::UnboundedSender<HubRequest>;
pub type HubRx = mpsc::UnboundedReceiver<HubRequest>;
