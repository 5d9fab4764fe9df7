//! Line-oriented text codec.
//!
//! Handy with `nc` and for replaying scenario files. Fields are comma
//! separated and trimmed; the free-text field of a message is always the
//! last one, so it may itself contain commas.
//!
//! Input format (lines → `ClientFrame`):
//!
//! - Join:
//!   `J, userId`
//!
//! - Send message:
//!   `S, senderId, receiverId, content`
//!
//! - Authenticate:
//!   `A, token`
//!
//! Output format (`OutputEvent` → line):
//!
//! - User status:
//!   `U, userId, userId, ...` (`U` alone when nobody is online)
//!
//! - Receive message:
//!   `R, senderId, timestamp, content`
//!
//! - Error:
//!   `E, message`
//!
//! Free text (message content, error messages) is escaped so it always
//! stays on one line: `\\` for a backslash, `\n` and `\r` for line
//! breaks. Any other backslash sequence is kept as typed. Identifiers may
//! not contain commas or line breaks in either encoding.

use chat_core::{InputEvent, OutputEvent, ReceiveMessage, SendMessage};

use crate::error::ProtocolError;
use crate::wire_types::{
    format_timestamp, parse_timestamp, require_identifier, require_non_empty, ClientFrame,
    EVENT_AUTHENTICATE, EVENT_ERROR, EVENT_JOIN, EVENT_RECEIVE_MESSAGE, EVENT_SEND_MESSAGE,
};

/// Parse a single client line.
///
/// Returns `Ok(None)` for blank lines or comments (starting with `#`).
pub fn parse_client_line(line: &str) -> Result<Option<ClientFrame>, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tag = trimmed.split(',').next().unwrap_or("").trim();

    let frame = match tag {
        "J" => parse_join(trimmed)?,
        "S" => parse_send(trimmed)?,
        "A" => parse_authenticate(trimmed)?,
        other => return Err(ProtocolError::UnknownEvent(other.to_string())),
    };

    Ok(Some(frame))
}

fn parse_join(line: &str) -> Result<ClientFrame, ProtocolError> {
    // J, userId
    let tokens = split_fields(line, 2);
    if tokens.len() != 2 {
        return Err(field_count(EVENT_JOIN, 2, tokens.len()));
    }

    let user_id = require_identifier("userId", tokens[1].clone())?;
    Ok(ClientFrame::Event(InputEvent::Join { user_id }))
}

fn parse_send(line: &str) -> Result<ClientFrame, ProtocolError> {
    // S, senderId, receiverId, content
    let tokens = split_fields(line, 4);
    if tokens.len() != 4 {
        return Err(field_count(EVENT_SEND_MESSAGE, 4, tokens.len()));
    }

    Ok(ClientFrame::Event(InputEvent::SendMessage(SendMessage {
        sender_id: require_identifier("senderId", tokens[1].clone())?,
        receiver_id: require_identifier("receiverId", tokens[2].clone())?,
        content: unescape(&tokens[3]),
    })))
}

fn parse_authenticate(line: &str) -> Result<ClientFrame, ProtocolError> {
    // A, token
    let tokens = split_fields(line, 2);
    if tokens.len() != 2 {
        return Err(field_count(EVENT_AUTHENTICATE, 2, tokens.len()));
    }

    Ok(ClientFrame::Authenticate {
        token: require_non_empty("token", tokens[1].clone())?,
    })
}

/// Format a client frame as a text line.
pub fn format_client(frame: &ClientFrame) -> String {
    match frame {
        ClientFrame::Authenticate { token } => format!("A, {}", token),
        ClientFrame::Event(InputEvent::Join { user_id }) => format!("J, {}", user_id),
        ClientFrame::Event(InputEvent::SendMessage(m)) => {
            format!("S, {}, {}, {}", m.sender_id, m.receiver_id, escape(&m.content))
        }
    }
}

/// Format a server event as a text line.
pub fn format_server(event: &OutputEvent) -> String {
    match event {
        OutputEvent::UserStatus(online) => {
            if online.is_empty() {
                "U".to_string()
            } else {
                format!("U, {}", online.join(", "))
            }
        }
        OutputEvent::ReceiveMessage(m) => format!(
            "R, {}, {}, {}",
            m.sender_id,
            format_timestamp(&m.timestamp),
            escape(&m.content)
        ),
        OutputEvent::Error(message) => format!("E, {}", escape(message)),
    }
}

/// Parse a server line back into an event (used by clients and tests).
pub fn parse_server_line(line: &str) -> Result<OutputEvent, ProtocolError> {
    let trimmed = line.trim();
    let tag = trimmed.split(',').next().unwrap_or("").trim();

    match tag {
        "U" => {
            let online = split_fields(trimmed, usize::MAX)
                .into_iter()
                .skip(1)
                .filter(|id| !id.is_empty())
                .collect();
            Ok(OutputEvent::UserStatus(online))
        }
        "R" => {
            let tokens = split_fields(trimmed, 4);
            if tokens.len() != 4 {
                return Err(field_count(EVENT_RECEIVE_MESSAGE, 4, tokens.len()));
            }
            Ok(OutputEvent::ReceiveMessage(ReceiveMessage {
                sender_id: tokens[1].clone(),
                timestamp: parse_timestamp(&tokens[2])?,
                content: unescape(&tokens[3]),
            }))
        }
        "E" => {
            let tokens = split_fields(trimmed, 2);
            if tokens.len() != 2 {
                return Err(field_count(EVENT_ERROR, 2, tokens.len()));
            }
            Ok(OutputEvent::Error(unescape(&tokens[1])))
        }
        other => Err(ProtocolError::UnknownEvent(other.to_string())),
    }
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// Split into at most `max` trimmed fields; the last field keeps any
/// remaining commas.
fn split_fields(s: &str, max: usize) -> Vec<String> {
    s.splitn(max, ',')
        .map(|tok| tok.trim().to_string())
        .collect()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn field_count(event: &'static str, expected: usize, got: usize) -> ProtocolError {
    ProtocolError::FieldCount {
        event,
        expected,
        got,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn parses_join() {
        assert_eq!(
            parse_client_line("J, alice").unwrap(),
            Some(ClientFrame::Event(InputEvent::join("alice")))
        );
    }

    #[test]
    fn message_content_keeps_commas() {
        assert_eq!(
            parse_client_line("S, a, b, hello, world").unwrap(),
            Some(ClientFrame::Event(InputEvent::send_message(
                "a",
                "b",
                "hello, world"
            )))
        );
    }

    #[test]
    fn empty_content_is_allowed() {
        assert_eq!(
            parse_client_line("S, a, b,").unwrap(),
            Some(ClientFrame::Event(InputEvent::send_message("a", "b", "")))
        );
    }

    #[test]
    fn comments_and_blanks_are_skipped() {
        assert_eq!(parse_client_line("# scenario").unwrap(), None);
        assert_eq!(parse_client_line("   ").unwrap(), None);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(matches!(
            parse_client_line("J"),
            Err(ProtocolError::FieldCount { expected: 2, got: 1, .. })
        ));
        assert!(matches!(
            parse_client_line("J, "),
            Err(ProtocolError::MissingField("userId"))
        ));
        assert!(matches!(
            parse_client_line("S, a, b"),
            Err(ProtocolError::FieldCount { expected: 4, got: 3, .. })
        ));
        assert!(matches!(
            parse_client_line("X, whatever"),
            Err(ProtocolError::UnknownEvent(_))
        ));
    }

    #[test]
    fn formats_user_status() {
        assert_eq!(
            format_server(&OutputEvent::UserStatus(vec!["a".into(), "c".into()])),
            "U, a, c"
        );
        assert_eq!(format_server(&OutputEvent::UserStatus(Vec::new())), "U");
    }

    #[test]
    fn server_lines_parse_back() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let event = OutputEvent::ReceiveMessage(ReceiveMessage {
            sender_id: "a".to_string(),
            content: "hi, there".to_string(),
            timestamp: ts,
        });

        let line = format_server(&event);
        assert_eq!(line, "R, a, 2024-03-01T10:00:00.000Z, hi, there");
        assert_eq!(parse_server_line(&line).unwrap(), event);

        assert_eq!(
            parse_server_line("U").unwrap(),
            OutputEvent::UserStatus(Vec::new())
        );
        assert_eq!(
            parse_server_line("E, unknown event: X").unwrap(),
            OutputEvent::error("unknown event: X")
        );
    }

    #[test]
    fn line_breaks_in_content_stay_on_one_line() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let event = OutputEvent::ReceiveMessage(ReceiveMessage {
            sender_id: "mallory".to_string(),
            content: "hi\nU, admin, ceo\r\\n".to_string(),
            timestamp: ts,
        });

        let line = format_server(&event);
        assert_eq!(
            line,
            r"R, mallory, 2024-03-01T10:00:00.000Z, hi\nU, admin, ceo\r\\n"
        );
        assert!(!line.contains('\n'));
        assert_eq!(parse_server_line(&line).unwrap(), event);

        let error = OutputEvent::error("unknown variant `x\ny`");
        assert_eq!(format_server(&error), r"E, unknown variant `x\ny`");
        assert_eq!(parse_server_line(&format_server(&error)).unwrap(), error);
    }

    #[test]
    fn typed_backslashes_survive() {
        assert_eq!(
            parse_client_line(r"S, a, b, C:\temp\dir \\ end\").unwrap(),
            Some(ClientFrame::Event(InputEvent::send_message(
                "a",
                "b",
                "C:\\temp\\dir \\ end\\"
            )))
        );
    }

    #[test]
    fn identifiers_with_line_breaks_are_rejected() {
        assert!(matches!(
            parse_client_line("S, a, b\rc, hi"),
            Err(ProtocolError::InvalidField("receiverId"))
        ));
    }

    #[test]
    fn client_lines_parse_back() {
        let frame = ClientFrame::Authenticate {
            token: "t0k3n".to_string(),
        };
        assert_eq!(
            parse_client_line(&format_client(&frame)).unwrap(),
            Some(frame)
        );
    }
}
