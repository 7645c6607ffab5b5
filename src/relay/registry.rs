use std::collections::HashMap;
use uuid::Uuid;

use crate::relay::protocol::UserProfile;
use crate::websocket::ConnectionHandle;

/// One connected client as far as the relay is concerned.
#[derive(Debug, Clone)]
pub struct Session {
    pub connection: ConnectionHandle,
    pub profile: Option<UserProfile>,
    /// Set on creation and carried along; nothing reads it yet.
    pub liveness: bool,
}

impl Session {
    pub fn name(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.name.as_str())
    }
}

/// Ordered set of sessions with an index from connection id to the first
/// session bound to that connection.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: Vec<Session>,
    index: HashMap<Uuid, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a session. There is no duplicate check; a connection that is
    /// added twice owns two sessions and lookups return the first.
    pub fn add(&mut self, connection: ConnectionHandle, profile: UserProfile) -> &Session {
        let position = self.sessions.len();
        self.index.entry(connection.id()).or_insert(position);
        self.sessions.push(Session {
            connection,
            profile: Some(profile),
            liveness: true,
        });
        &self.sessions[position]
    }

    pub fn find_by_connection(&self, connection: &ConnectionHandle) -> Option<&Session> {
        self.index
            .get(&connection.id())
            .map(|&position| &self.sessions[position])
    }

    pub fn replace_all(&mut self, sessions: Vec<Session>) {
        let mut index = HashMap::with_capacity(sessions.len());
        for (position, session) in sessions.iter().enumerate() {
            index.entry(session.connection.id()).or_insert(position);
        }
        self.sessions = sessions;
        self.index = index;
    }

    pub fn snapshot(&self) -> &[Session] {
        &self.sessions
    }

    /// Registered profiles in insertion order.
    pub fn profiles(&self) -> Vec<UserProfile> {
        self.sessions
            .iter()
            .filter_map(|s| s.profile.clone())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.sessions
            .iter()
            .filter_map(|s| s.name().map(str::to_string))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn handle() -> ConnectionHandle {
        let (tx, _rx) = mpsc::unbounded_channel();
        ConnectionHandle::new(tx)
    }

    fn profile(name: &str) -> UserProfile {
        UserProfile {
            name: name.to_string(),
            avatar: format!("{}.png", name),
            bio: String::new(),
        }
    }

    #[test]
    fn test_add_and_find() {
        let mut registry = Registry::new();
        let alice = handle();
        let stranger = handle();

        let session = registry.add(alice.clone(), profile("Alice"));
        assert!(session.liveness);
        assert_eq!(session.name(), Some("Alice"));

        assert_eq!(registry.find_by_connection(&alice).unwrap().name(), Some("Alice"));
        assert!(registry.find_by_connection(&stranger).is_none());
    }

    #[test]
    fn test_order_is_insertion_order() {
        let mut registry = Registry::new();
        for name in ["Carol", "Alice", "Bob"] {
            registry.add(handle(), profile(name));
        }
        assert_eq!(registry.names(), vec!["Carol", "Alice", "Bob"]);
        assert_eq!(registry.profiles()[1], profile("Alice"));
    }

    #[test]
    fn test_duplicate_add_keeps_first_match() {
        let mut registry = Registry::new();
        let conn = handle();
        registry.add(conn.clone(), profile("First"));
        registry.add(conn.clone(), profile("Second"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find_by_connection(&conn).unwrap().name(), Some("First"));
    }

    #[test]
    fn test_replace_all_rebuilds_index() {
        let mut registry = Registry::new();
        let gone = handle();
        let kept = handle();
        registry.add(gone.clone(), profile("Gone"));
        registry.add(kept.clone(), profile("Kept"));

        let survivors: Vec<Session> = registry
            .snapshot()
            .iter()
            .filter(|s| s.connection == kept)
            .cloned()
            .collect();
        registry.replace_all(survivors);

        assert_eq!(registry.len(), 1);
        assert!(registry.find_by_connection(&gone).is_none());
        assert_eq!(registry.find_by_connection(&kept).unwrap().name(), Some("Kept"));
    }
}
