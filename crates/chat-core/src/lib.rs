//! chat-core
//!
//! Pure chat presence logic:
//! - connection handles
//! - messages (input/output events)
//! - presence directory
//! - message relay
//! - hub that owns all of the above for one server

pub mod connection;
pub mod messages;
pub mod directory;
pub mod relay;
pub mod hub;
pub mod error;

pub use connection::{ConnectionId, ConnectionState};

pub use messages::{
    ChatMessage,
    Delivery,
    InputEvent,
    OutputEvent,
    ReceiveMessage,
    SendMessage,
};

pub use directory::PresenceDirectory;
pub use relay::relay;
pub use hub::{ChatHub, IdentityPolicy};
pub use error::ChatError;
