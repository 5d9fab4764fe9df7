//! Presence directory: who is online, and on which connection.
//!
//! - Keyed by user identifier, one connection per identifier
//!   (last-connection-wins).
//! - Removal is keyed by connection handle, so a late disconnect of a
//!   superseded connection never evicts the newer entry.
//! - Iteration order is insertion order; overwriting an identifier keeps
//!   its position.

use indexmap::IndexMap;

use crate::connection::ConnectionId;

#[derive(Debug, Default)]
pub struct PresenceDirectory {
    /// user id -> current connection.
    entries: IndexMap<String, ConnectionId>,
}

impl PresenceDirectory {
    /// Create a new, empty directory.
    pub fn new() -> Self {
        PresenceDirectory::default()
    }

    /// Insert or overwrite the entry for `user_id`.
    ///
    /// Returns the superseded connection, if the identifier was already
    /// bound to a different one.
    pub fn join(&mut self, user_id: &str, conn: ConnectionId) -> Option<ConnectionId> {
        match self.entries.get_mut(user_id) {
            Some(current) => {
                let previous = std::mem::replace(current, conn);
                (previous != conn).then_some(previous)
            }
            None => {
                self.entries.insert(user_id.to_string(), conn);
                None
            }
        }
    }

    /// Remove every entry currently bound to `conn`.
    ///
    /// Returns the identifiers that went offline. Entries that were
    /// overwritten by a newer connection are not touched.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<String> {
        let mut removed = Vec::new();
        self.entries.retain(|user_id, current| {
            if *current == conn {
                removed.push(user_id.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Current online identifiers, in directory order.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Live connection for `user_id`, if online.
    pub fn lookup(&self, user_id: &str) -> Option<ConnectionId> {
        self.entries.get(user_id).copied()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.entries.contains_key(user_id)
    }

    /// True if any entry still points at `conn`.
    pub fn is_bound(&self, conn: ConnectionId) -> bool {
        self.entries.values().any(|c| *c == conn)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H1: ConnectionId = ConnectionId(1);
    const H2: ConnectionId = ConnectionId(2);
    const H3: ConnectionId = ConnectionId(3);

    #[test]
    fn join_then_disconnect() {
        let mut dir = PresenceDirectory::new();
        assert_eq!(dir.join("alice", H1), None);
        assert_eq!(dir.join("bob", H2), None);
        assert_eq!(dir.snapshot(), vec!["alice", "bob"]);

        assert_eq!(dir.disconnect(H1), vec!["alice".to_string()]);
        assert_eq!(dir.snapshot(), vec!["bob"]);
        assert_eq!(dir.lookup("alice"), None);
    }

    #[test]
    fn last_connection_wins() {
        let mut dir = PresenceDirectory::new();
        dir.join("u", H1);
        assert_eq!(dir.join("u", H2), Some(H1));
        assert_eq!(dir.lookup("u"), Some(H2));

        // Late disconnect of the superseded handle is a no-op.
        assert!(dir.disconnect(H1).is_empty());
        assert!(dir.contains("u"));

        assert_eq!(dir.disconnect(H2), vec!["u".to_string()]);
        assert!(dir.is_empty());
    }

    #[test]
    fn rejoin_on_same_connection_is_not_a_supersede() {
        let mut dir = PresenceDirectory::new();
        dir.join("u", H1);
        assert_eq!(dir.join("u", H1), None);
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn one_connection_many_identities() {
        let mut dir = PresenceDirectory::new();
        dir.join("a", H1);
        dir.join("b", H2);
        dir.join("c", H1);
        assert!(dir.is_bound(H1));

        let mut gone = dir.disconnect(H1);
        gone.sort();
        assert_eq!(gone, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(dir.snapshot(), vec!["b"]);
        assert!(!dir.is_bound(H1));
    }

    #[test]
    fn overwrite_keeps_position_and_rejoin_appends() {
        let mut dir = PresenceDirectory::new();
        dir.join("a", H1);
        dir.join("b", H2);
        dir.join("a", H3);
        assert_eq!(dir.snapshot(), vec!["a", "b"]);

        dir.disconnect(H3);
        dir.join("a", H1);
        assert_eq!(dir.snapshot(), vec!["b", "a"]);
    }

    #[test]
    fn snapshot_matches_last_event_model() {
        // (user, conn, is_join)
        let script: &[(&str, u64, bool)] = &[
            ("a", 1, true),
            ("b", 2, true),
            ("a", 3, true),
            ("", 1, false),
            ("c", 4, true),
            ("", 2, false),
            ("b", 5, true),
            ("", 3, false),
            ("", 9, false),
        ];

        let mut dir = PresenceDirectory::new();
        let mut model: Vec<(String, u64)> = Vec::new();

        for &(user, conn, is_join) in script {
            if is_join {
                dir.join(user, ConnectionId(conn));
                model.retain(|(u, _)| u != user);
                model.push((user.to_string(), conn));
            } else {
                dir.disconnect(ConnectionId(conn));
                model.retain(|(_, c)| *c != conn);
            }

            let mut expected: Vec<String> = model.iter().map(|(u, _)| u.clone()).collect();
            let mut actual = dir.snapshot();
            expected.sort();
            actual.sort();
            assert_eq!(actual, expected);
        }

        let mut end = dir.snapshot();
        end.sort();
        assert_eq!(end, vec!["b", "c"]);
    }
}
