//! Error types for routing and transport failures.

use crate::session::SessionId;
use thiserror::Error;

/// Failure reported by a session handle when a send cannot be handed to
/// the underlying connection.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection is closed")]
    Closed,

    #[error("outbound queue is full")]
    Saturated,
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Frontend session {0} not found")]
    SessionNotFound(SessionId),

    #[error("Failed to send to frontend session {session_id}: {source}")]
    Transport {
        session_id: SessionId,
        #[source]
        source: TransportError,
    },

    #[error("Failed to deploy relay endpoint: {0}")]
    HandshakeUnavailable(String),
}

impl RelayError {
    /// Whether this is a late send to a connection that already went away.
    ///
    /// These are expected during connection churn and are dropped quietly.
    pub fn is_closed_transport(&self) -> bool {
        matches!(
            self,
            RelayError::Transport {
                source: TransportError::Closed,
                ..
            }
        )
    }
}
