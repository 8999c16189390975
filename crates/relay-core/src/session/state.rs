//! Per-session identity, handle and lifecycle state.

use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a frontend session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Capability to talk to one live client connection.
///
/// Implemented by the transport layer. The relay only ever looks sessions up
/// and sends through them; tearing the connection down stays with the
/// transport.
pub trait SessionHandle: Send + Sync {
    /// Identifier assigned by the transport, stable for the connection's lifetime.
    fn id(&self) -> &SessionId;

    /// Hand a text message to the connection.
    ///
    /// Must not block. Fails when the connection is closed or its outbound
    /// queue is saturated.
    fn send_text(&self, text: &str) -> Result<(), TransportError>;

    /// Ask the transport to close the connection.
    fn close(&self);
}

/// Shared handle to a live session.
pub type Session = Arc<dyn SessionHandle>;

/// Lifecycle of a single connection.
///
/// `Connecting -> Open -> Closed`, or `Open -> Error -> Closed` on a
/// transport failure. Nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Error,
    Closed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Open) | (Open, Error) | (Open, Closed) | (Error, Closed)
        )
    }

    /// Move to `next` if the transition is legal. Returns whether it happened.
    pub fn advance(&mut self, next: SessionState) -> bool {
        if self.can_transition_to(next) {
            *self = next;
            true
        } else {
            false
        }
    }

    /// Only open sessions hand inbound messages to the relay.
    pub fn accepts_messages(self) -> bool {
        self == SessionState::Open
    }

    pub fn is_closed(self) -> bool {
        self == SessionState::Closed
    }
}
