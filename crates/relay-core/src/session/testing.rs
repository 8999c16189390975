//! In-memory session handle for unit tests.

use super::state::{Session, SessionHandle, SessionId};
use crate::error::TransportError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Records every text handed to it. Can be switched into a failing mode to
/// stand in for a closed connection.
pub struct RecordingSession {
    id: SessionId,
    sent: Mutex<Vec<String>>,
    broken: AtomicBool,
    closed: AtomicBool,
}

impl RecordingSession {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: SessionId::from(id),
            sent: Mutex::new(Vec::new()),
            broken: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        })
    }

    pub fn broken(id: &str) -> Arc<Self> {
        let session = Self::new(id);
        session.broken.store(true, Ordering::SeqCst);
        session
    }

    pub fn as_session(self: &Arc<Self>) -> Session {
        Arc::clone(self) as Session
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl SessionHandle for RecordingSession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn send_text(&self, text: &str) -> Result<(), TransportError> {
        if self.broken.load(Ordering::SeqCst) || self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
