//! SessionRegistry - the live-connection table shared by every connection task.

use super::state::{Session, SessionId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Concurrency-safe mapping from session id to connection handle.
///
/// The lock only guards the map. Callers get cloned handles back and send
/// through them after the lock is released, so a slow client never stalls
/// lookups or broadcasts to other sessions.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a session, replacing any entry with the same id.
    ///
    /// Returns the replaced handle, if there was one.
    pub fn open(&self, session: Session) -> Option<Session> {
        let id = session.id().clone();
        self.write().insert(id, session)
    }

    /// Remove a session. Absent ids are a no-op.
    pub fn close(&self, session_id: &SessionId) -> Option<Session> {
        self.write().remove(session_id)
    }

    /// Look up a session by id.
    pub fn get(&self, session_id: &SessionId) -> Option<Session> {
        self.read().get(session_id).cloned()
    }

    /// Point-in-time snapshot of every registered session.
    pub fn get_all(&self) -> Vec<Session> {
        self.read().values().cloned().collect()
    }

    /// Point-in-time snapshot of every registered session id.
    pub fn ids(&self) -> Vec<SessionId> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave the map half-updated
    // (every mutation is a single insert/remove), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, Session>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
