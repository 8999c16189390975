//! Relay - lifecycle hooks and routing between frontend sessions and the backend.
//!
//! One `Relay` is built at startup and shared (behind an `Arc`) by every
//! connection task. It owns the [`SessionRegistry`]; nothing else touches
//! session state.
//!
//! Every send is best effort and at-most-once. A missing session or a
//! failing connection is logged and the message is dropped; errors never
//! propagate to the caller and never affect other sessions.

use crate::backend::{Backend, Outbound, OutboundReceiver, SessionMessage};
use crate::error::RelayError;
use crate::session::{Session, SessionId, SessionRegistry};
use std::sync::Arc;

/// Prefix added to every broadcast payload.
pub const BROADCAST_PREFIX: &str = "BROADCAST: ";

pub struct Relay {
    registry: SessionRegistry,
    backend: Arc<dyn Backend>,
}

impl Relay {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            registry: SessionRegistry::new(),
            backend,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Lifecycle hooks, called by the transport.
    // ------------------------------------------------------------------

    /// Register the session and acknowledge it.
    pub fn on_open(&self, session: Session) {
        let id = session.id().clone();
        if self.registry.open(Arc::clone(&session)).is_some() {
            log::debug!("Replaced handle for frontend session {}", id);
        }
        log::info!("Opened frontend session {}", id);

        if let Err(e) = send(&session, &format!("Opened frontend session {}", id)) {
            log_send_failure(&e);
        }
    }

    /// Forward inbound text to the backend, untouched.
    pub fn on_message(&self, session: &Session, text: String) {
        log::debug!("Frontend session {} sent {} bytes", session.id(), text.len());
        self.backend.forward(SessionMessage {
            session_id: session.id().clone(),
            text,
        });
    }

    /// Unregister the session. Safe to call more than once.
    pub fn on_close(&self, session: &Session, reason: &str) {
        log::info!("Closed frontend session {} ({})", session.id(), reason);
        self.registry.close(session.id());
    }

    /// Log a transport failure.
    ///
    /// The session stays registered: the transport follows every error
    /// with `on_close`, which is what removes it.
    pub fn on_error(&self, session: &Session, error: &dyn std::fmt::Display) {
        log::warn!("Error from frontend session {}: {}", session.id(), error);
    }

    // ------------------------------------------------------------------
    // Routing, called by the backend.
    // ------------------------------------------------------------------

    /// Targeted send. Returns whether the text was handed to the connection.
    pub fn deliver(&self, message: &SessionMessage) -> bool {
        match self.try_deliver(&message.session_id, &message.text) {
            Ok(()) => true,
            Err(e) => {
                log_send_failure(&e);
                false
            }
        }
    }

    fn try_deliver(&self, session_id: &SessionId, text: &str) -> Result<(), RelayError> {
        let session = self
            .registry
            .get(session_id)
            .ok_or_else(|| RelayError::SessionNotFound(session_id.clone()))?;
        send(&session, text)
    }

    /// Send `BROADCAST: {text}` to every registered session.
    ///
    /// Each send is independent; a failing session is logged and skipped.
    /// Returns how many sessions accepted the message.
    pub fn broadcast(&self, text: &str) -> usize {
        log::info!("{}{}", BROADCAST_PREFIX, text);
        let payload = format!("{}{}", BROADCAST_PREFIX, text);

        let sessions = self.registry.get_all();
        let mut delivered = 0;
        for session in &sessions {
            match send(session, &payload) {
                Ok(()) => delivered += 1,
                Err(e) => log_send_failure(&e),
            }
        }
        log::debug!("Broadcast reached {}/{} sessions", delivered, sessions.len());
        delivered
    }

    /// Route a backend trigger.
    pub fn dispatch(&self, outbound: Outbound) {
        match outbound {
            Outbound::Deliver(message) => {
                self.deliver(&message);
            }
            Outbound::Broadcast { text } => {
                self.broadcast(&text);
            }
        }
    }

    /// Drain backend triggers until every sender is dropped.
    pub async fn run_outbound(&self, mut receiver: OutboundReceiver) {
        while let Some(outbound) = receiver.recv().await {
            self.dispatch(outbound);
        }
        log::debug!("Outbound channel closed");
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.registry.ids()
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }
}

fn send(session: &Session, text: &str) -> Result<(), RelayError> {
    session
        .send_text(text)
        .map_err(|source| RelayError::Transport {
            session_id: session.id().clone(),
            source,
        })
}

fn log_send_failure(error: &RelayError) {
    if error.is_closed_transport() {
        log::debug!("{}", error);
    } else {
        log::warn!("{}", error);
    }
}
