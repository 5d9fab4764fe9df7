//! Error types for the chat core.
//!
//! Nothing in here is fatal: every variant describes a single rejected
//! event, and the hub state is left untouched when one is returned.

use thiserror::Error;

use crate::connection::ConnectionId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Event arrived for a connection the hub never registered (or that
    /// already disconnected).
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// A join or send was attempted without a verified principal while
    /// verification is required.
    #[error("connection is not authenticated")]
    NotAuthenticated,

    /// The claimed identifier does not match the verified principal.
    #[error("claimed identity {claimed:?} does not match authenticated user {verified:?}")]
    IdentityMismatch { claimed: String, verified: String },

    /// An identifier was empty.
    #[error("user identifier must not be empty")]
    EmptyUserId,
}
