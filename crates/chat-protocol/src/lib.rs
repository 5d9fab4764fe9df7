//! chat-protocol
//!
//! Wire-level encoding/decoding for the chat server.
//!
//! This crate turns logical chat events (`chat_core::InputEvent` /
//! `OutputEvent`) into lines of text and back again.
//!
//! - [`json_codec`] : JSON event frames (`{"event": ..., "data": ...}`)
//! - [`text_codec`] : comma separated lines (for netcat / replay)
//!
//! Both encodings are newline delimited; [`Encoding::sniff`] picks one
//! from the first significant byte a client sends.

pub mod wire_types;
pub mod json_codec;
pub mod text_codec;
pub mod error;

pub use error::ProtocolError;
pub use wire_types::{ClientFrame, DEFAULT_MAX_LINE_BYTES};

use chat_core::OutputEvent;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Line encoding used by one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Text,
}

impl Encoding {
    /// JSON frames always open with `{`; anything else is treated as text.
    pub fn detect(first_byte: u8) -> Self {
        if first_byte == b'{' {
            Encoding::Json
        } else {
            Encoding::Text
        }
    }

    /// Pick the encoding from the start of a connection's input, skipping
    /// a UTF-8 byte order mark and leading ASCII whitespace. `None` until
    /// a significant byte has arrived.
    pub fn sniff(input: &[u8]) -> Option<Self> {
        let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
        if UTF8_BOM.starts_with(input) && !input.is_empty() {
            // Part of a BOM so far.
            return None;
        }
        input
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .map(|&b| Encoding::detect(b))
    }

    /// Decode one client line. `Ok(None)` means the line carries nothing
    /// (blank, or a text-mode comment).
    pub fn decode_client(self, line: &str) -> Result<Option<ClientFrame>, ProtocolError> {
        let line = line.strip_prefix('\u{FEFF}').unwrap_or(line);
        match self {
            Encoding::Json => {
                if line.trim().is_empty() {
                    return Ok(None);
                }
                json_codec::decode_client(line).map(Some)
            }
            Encoding::Text => text_codec::parse_client_line(line),
        }
    }

    /// Encode one server event as a line, without the trailing newline.
    pub fn encode_server(self, event: &OutputEvent) -> Result<String, ProtocolError> {
        match self {
            Encoding::Json => json_codec::encode_server(event),
            Encoding::Text => Ok(text_codec::format_server(event)),
        }
    }
}
