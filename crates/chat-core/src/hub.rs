//! Chat hub: the single owner of presence state.
//!
//! The hub ties together:
//! - the set of registered transport connections (and their lifecycle),
//! - the [`PresenceDirectory`],
//! - the [`relay`] function,
//! - the identity policy for `join` / `sendMessage`.
//!
//! It never touches the network. Every operation returns the list of
//! [`Delivery`]s the transport layer should push, so the same hub can be
//! driven by a server task or directly from tests.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::connection::{ConnectionId, ConnectionState};
use crate::directory::PresenceDirectory;
use crate::error::ChatError;
use crate::messages::{ChatMessage, Delivery, InputEvent, OutputEvent, SendMessage};
use crate::relay::relay;

/// How much the hub trusts identifiers supplied by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityPolicy {
    /// Any connection may claim any identifier.
    #[default]
    TrustClaimed,

    /// `join` and `sendMessage` must match the principal bound through
    /// [`ChatHub::authenticate`].
    RequireVerified,
}

#[derive(Debug)]
struct Session {
    state: ConnectionState,
    principal: Option<String>,
}

#[derive(Debug, Default)]
pub struct ChatHub {
    policy: IdentityPolicy,

    /// Registered connections, ordered by id so broadcasts are
    /// deterministic.
    sessions: BTreeMap<ConnectionId, Session>,

    directory: PresenceDirectory,
}

impl ChatHub {
    /// Create an empty hub that trusts claimed identifiers.
    pub fn new() -> Self {
        ChatHub::default()
    }

    pub fn with_policy(policy: IdentityPolicy) -> Self {
        ChatHub {
            policy,
            ..ChatHub::default()
        }
    }

    pub fn policy(&self) -> IdentityPolicy {
        self.policy
    }

    /// Register a new transport session. Emits nothing.
    pub fn connect(&mut self, conn: ConnectionId) {
        self.sessions.entry(conn).or_insert(Session {
            state: ConnectionState::Connected,
            principal: None,
        });
    }

    /// Bind a verified principal to `conn`.
    pub fn authenticate(&mut self, conn: ConnectionId, principal: &str) -> Result<(), ChatError> {
        if principal.is_empty() {
            return Err(ChatError::EmptyUserId);
        }
        let session = self
            .sessions
            .get_mut(&conn)
            .ok_or(ChatError::UnknownConnection(conn))?;
        session.principal = Some(principal.to_string());
        Ok(())
    }

    /// Process one client event, stamping relayed messages with the
    /// current time.
    pub fn process_event(
        &mut self,
        conn: ConnectionId,
        event: InputEvent,
    ) -> Result<Vec<Delivery>, ChatError> {
        self.process_event_at(conn, event, Utc::now())
    }

    /// Same as [`ChatHub::process_event`] with an explicit clock.
    pub fn process_event_at(
        &mut self,
        conn: ConnectionId,
        event: InputEvent,
        now: DateTime<Utc>,
    ) -> Result<Vec<Delivery>, ChatError> {
        match event {
            InputEvent::Join { user_id } => self.process_join(conn, user_id),
            InputEvent::SendMessage(req) => self.process_send(conn, req, now),
        }
    }

    /// Drop `conn` and everything bound to it.
    ///
    /// For a registered connection this always yields one `userStatus`
    /// per remaining connection, even when no identifier went offline.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<Delivery> {
        if self.sessions.remove(&conn).is_none() {
            return Vec::new();
        }
        self.directory.disconnect(conn);
        self.broadcast_status()
    }

    /// Current online identifiers.
    pub fn snapshot(&self) -> Vec<String> {
        self.directory.snapshot()
    }

    pub fn directory(&self) -> &PresenceDirectory {
        &self.directory
    }

    /// `None` means the connection is not registered (disconnected).
    pub fn connection_state(&self, conn: ConnectionId) -> Option<ConnectionState> {
        self.sessions.get(&conn).map(|s| s.state)
    }

    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    // -------------------------------------------------------------------------
    // Internal handlers
    // -------------------------------------------------------------------------

    fn process_join(&mut self, conn: ConnectionId, user_id: String) -> Result<Vec<Delivery>, ChatError> {
        if user_id.is_empty() {
            return Err(ChatError::EmptyUserId);
        }

        let policy = self.policy;
        let session = self
            .sessions
            .get_mut(&conn)
            .ok_or(ChatError::UnknownConnection(conn))?;

        check_identity(policy, session.principal.as_deref(), &user_id)?;

        session.state = ConnectionState::Joined;
        self.directory.join(&user_id, conn);

        Ok(self.broadcast_status())
    }

    fn process_send(
        &mut self,
        conn: ConnectionId,
        req: SendMessage,
        now: DateTime<Utc>,
    ) -> Result<Vec<Delivery>, ChatError> {
        let session = self
            .sessions
            .get(&conn)
            .ok_or(ChatError::UnknownConnection(conn))?;

        check_identity(self.policy, session.principal.as_deref(), &req.sender_id)?;

        let msg = ChatMessage::from_request(req, now);
        Ok(relay(&self.directory, msg).into_iter().collect())
    }

    /// One `userStatus` with the post-event set for every registered
    /// connection.
    fn broadcast_status(&self) -> Vec<Delivery> {
        let online = self.directory.snapshot();
        self.sessions
            .keys()
            .map(|&to| Delivery::new(to, OutputEvent::UserStatus(online.clone())))
            .collect()
    }
}

fn check_identity(
    policy: IdentityPolicy,
    principal: Option<&str>,
    claimed: &str,
) -> Result<(), ChatError> {
    match policy {
        IdentityPolicy::TrustClaimed => Ok(()),
        IdentityPolicy::RequireVerified => match principal {
            None => Err(ChatError::NotAuthenticated),
            Some(verified) if verified == claimed => Ok(()),
            Some(verified) => Err(ChatError::IdentityMismatch {
                claimed: claimed.to_string(),
                verified: verified.to_string(),
            }),
        },
    }
}
