//! Message relay.
//!
//! Stateless, at-most-once forwarding: the receiver's live connection is
//! looked up in the directory at send time. No persistence and no
//! offline queue; an absent receiver means the message is dropped.

use crate::directory::PresenceDirectory;
use crate::messages::{ChatMessage, Delivery, OutputEvent};

/// Route `msg` to the receiver's current connection.
///
/// Returns `None` when the receiver is offline. That is not an error:
/// the sender gets no acknowledgement either way.
pub fn relay(directory: &PresenceDirectory, msg: ChatMessage) -> Option<Delivery> {
    let to = directory.lookup(&msg.receiver_id)?;
    Some(Delivery::new(to, OutputEvent::ReceiveMessage(msg.into_receive())))
}
