//! Presence Registry
//!
//! Concurrent mapping from username to the session currently representing
//! that user online. A single registry instance is owned by the application
//! state and injected into every session at construction, so tests can run
//! any number of independent registries.

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Handle to a live session's outbound stream.
///
/// Cloning the handle clones the sender side of the session's outbound
/// channel; the session's writer task is the only consumer.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: Uuid,
    user_id: i64,
    sender: mpsc::UnboundedSender<String>,
}

impl SessionHandle {
    pub fn new(session_id: Uuid, user_id: i64, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            session_id,
            user_id,
            sender,
        }
    }

    /// Unique id of the session instance this handle belongs to.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The authenticated user this session represents.
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Queue a line on the session's outbound stream.
    ///
    /// Returns `false` if the session's writer has already shut down.
    pub fn send(&self, line: impl Into<String>) -> bool {
        self.sender.send(line.into()).is_ok()
    }
}

/// Registry of online users.
///
/// Entries are added on successful authentication and removed on session
/// teardown. At most one entry exists per username: a second login for the
/// same name silently replaces the first ("last registration wins"); the
/// displaced session is not notified.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    sessions: DashMap<String, SessionHandle>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a session under a username, replacing any prior entry for
    /// the same name. Returns the displaced handle, if any.
    pub fn register(&self, username: &str, handle: SessionHandle) -> Option<SessionHandle> {
        let displaced = self.sessions.insert(username.to_string(), handle);
        if let Some(old) = &displaced {
            tracing::info!(
                username = %username,
                displaced_session = %old.session_id(),
                "Re-registration displaced an existing session"
            );
        }
        displaced
    }

    /// Remove a session's entry, but only if the entry still belongs to that
    /// session. A session displaced by a later login must not evict its
    /// successor during its own teardown.
    ///
    /// Returns `true` if an entry was removed.
    pub fn deregister(&self, username: &str, session_id: Uuid) -> bool {
        self.sessions
            .remove_if(username, |_, handle| handle.session_id() == session_id)
            .is_some()
    }

    /// Find the session currently registered for a user id, if any.
    ///
    /// Stale entries cannot exist (replacement drops the old handle, and
    /// removal is guarded), so at most one entry matches.
    pub fn find_by_user_id(&self, user_id: i64) -> Option<SessionHandle> {
        self.sessions
            .iter()
            .find(|entry| entry.value().user_id() == user_id)
            .map(|entry| entry.value().clone())
    }

    /// Whether a username currently has a registered session.
    pub fn is_registered(&self, username: &str) -> bool {
        self.sessions.contains_key(username)
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
