//! Errors raised while decoding a frame.
//!
//! A `ProtocolError` always concerns a single line; the connection that
//! sent it stays usable.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Unknown event tag.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// A required field is absent or empty.
    #[error("missing or empty field: {0}")]
    MissingField(&'static str),

    /// An identifier contains a comma or a line break.
    #[error("invalid characters in field: {0}")]
    InvalidField(&'static str),

    /// Line bytes are not valid UTF-8.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,

    /// Text line had the wrong number of comma separated fields.
    #[error("{event} expects {expected} fields, got {got}")]
    FieldCount {
        event: &'static str,
        expected: usize,
        got: usize,
    },

    /// Timestamp was not RFC 3339.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// JSON frame did not match any known event shape.
    #[error("malformed JSON frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Line grew past the configured cap without a newline.
    #[error("frame exceeds {0} bytes")]
    FrameTooLong(usize),
}
