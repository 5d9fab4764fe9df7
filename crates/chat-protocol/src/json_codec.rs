//! JSON event frames.
//!
//! One object per line, tagged by event name with the payload under
//! `data`:
//!
//! ```text
//! Client → server
//! ---------------
//! {"event":"join","data":"<userId>"}
//! {"event":"sendMessage","data":{"senderId":"..","receiverId":"..","content":".."}}
//! {"event":"authenticate","data":{"token":".."}}
//!
//! Server → client
//! ---------------
//! {"event":"userStatus","data":["<userId>", ...]}
//! {"event":"receiveMessage","data":{"senderId":"..","content":"..","timestamp":"<RFC 3339>"}}
//! {"event":"error","data":{"message":".."}}
//! ```
//!
//! Unknown fields inside a payload are ignored (browser clients also
//! send their local `timestamp` with `sendMessage`).

use chat_core::{InputEvent, OutputEvent, ReceiveMessage, SendMessage};

use crate::error::ProtocolError;
use crate::wire_types::{
    format_timestamp, parse_timestamp, require_identifier, require_non_empty, ClientFrame,
    WireAuthenticate,
    WireClientFrame, WireError, WireReceiveMessage, WireSendMessage, WireServerFrame,
};

/// Decode one client frame.
pub fn decode_client(line: &str) -> Result<ClientFrame, ProtocolError> {
    let wire: WireClientFrame = serde_json::from_str(line.trim())?;

    let frame = match wire {
        WireClientFrame::Join(user_id) => ClientFrame::Event(InputEvent::Join {
            user_id: require_identifier("userId", user_id)?,
        }),
        WireClientFrame::SendMessage(m) => ClientFrame::Event(InputEvent::SendMessage(SendMessage {
            sender_id: require_identifier("senderId", m.sender_id)?,
            receiver_id: require_identifier("receiverId", m.receiver_id)?,
            content: m.content,
        })),
        WireClientFrame::Authenticate(a) => ClientFrame::Authenticate {
            token: require_non_empty("token", a.token)?,
        },
    };

    Ok(frame)
}

/// Encode one client frame (used by clients and tests).
pub fn encode_client(frame: &ClientFrame) -> Result<String, ProtocolError> {
    let wire = match frame {
        ClientFrame::Authenticate { token } => WireClientFrame::Authenticate(WireAuthenticate {
            token: token.clone(),
        }),
        ClientFrame::Event(InputEvent::Join { user_id }) => WireClientFrame::Join(user_id.clone()),
        ClientFrame::Event(InputEvent::SendMessage(m)) => {
            WireClientFrame::SendMessage(WireSendMessage {
                sender_id: m.sender_id.clone(),
                receiver_id: m.receiver_id.clone(),
                content: m.content.clone(),
            })
        }
    };

    Ok(serde_json::to_string(&wire)?)
}

/// Encode one server event.
pub fn encode_server(event: &OutputEvent) -> Result<String, ProtocolError> {
    let wire = match event {
        OutputEvent::UserStatus(online) => WireServerFrame::UserStatus(online.clone()),
        OutputEvent::ReceiveMessage(m) => WireServerFrame::ReceiveMessage(WireReceiveMessage {
            sender_id: m.sender_id.clone(),
            content: m.content.clone(),
            timestamp: format_timestamp(&m.timestamp),
        }),
        OutputEvent::Error(message) => WireServerFrame::Error(WireError {
            message: message.clone(),
        }),
    };

    Ok(serde_json::to_string(&wire)?)
}

/// Decode one server event (used by clients and tests).
pub fn decode_server(line: &str) -> Result<OutputEvent, ProtocolError> {
    let wire: WireServerFrame = serde_json::from_str(line.trim())?;

    let event = match wire {
        WireServerFrame::UserStatus(online) => OutputEvent::UserStatus(online),
        WireServerFrame::ReceiveMessage(m) => OutputEvent::ReceiveMessage(ReceiveMessage {
            sender_id: m.sender_id,
            content: m.content,
            timestamp: parse_timestamp(&m.timestamp)?,
        }),
        WireServerFrame::Error(e) => OutputEvent::Error(e.message),
    };

    Ok(event)
}
