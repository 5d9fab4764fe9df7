//! Connection handles and per-connection lifecycle state.

use std::fmt;

/// Opaque handle for one live transport session.
///
/// The transport layer guarantees uniqueness over the lifetime of the
/// process; the core only ever compares handles for identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a registered connection.
///
/// `Disconnected` is terminal and is represented by the connection no
/// longer being known to the hub at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport is up, but the client has not joined yet.
    Connected,

    /// The client has joined and is addressable by at least one identifier.
    Joined,
}
