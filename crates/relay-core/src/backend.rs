//! Contracts between the relay and the backend processing unit.
//!
//! Inbound traffic flows relay -> backend through the [`Backend`] trait.
//! Backend replies flow back as [`Outbound`] triggers, either by calling
//! [`Relay::dispatch`](crate::Relay::dispatch) directly or through the
//! channel created by [`outbound_channel`].
//!
//! # Example
//!
//! ```rust
//! use relay_core::backend::{outbound_channel, ChannelBackend, Outbound};
//! use relay_core::Relay;
//! use std::sync::Arc;
//!
//! let (backend, _inbound) = ChannelBackend::new();
//! let relay = Arc::new(Relay::new(Arc::new(backend)));
//! let (outbound, _outbound_rx) = outbound_channel();
//!
//! // A backend task reads `inbound` and answers through `outbound`:
//! outbound
//!     .send(Outbound::Broadcast { text: "hello".to_string() })
//!     .unwrap();
//!
//! // The relay drains triggers (in async context):
//! // relay.run_outbound(outbound_rx).await;
//! ```

use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A piece of text addressed to, or received from, one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMessage {
    pub session_id: SessionId,
    pub text: String,
}

impl SessionMessage {
    pub fn new(session_id: impl Into<SessionId>, text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            text: text.into(),
        }
    }
}

/// A backend-to-frontend send request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outbound {
    /// Send to exactly one session.
    Deliver(SessionMessage),
    /// Send to every session registered at dispatch time.
    Broadcast { text: String },
}

/// Receives every inbound message from every session.
///
/// Called from connection tasks, concurrently. Implementations must return
/// quickly and never call back into the relay synchronously.
pub trait Backend: Send + Sync {
    fn forward(&self, message: SessionMessage);
}

impl<F> Backend for F
where
    F: Fn(SessionMessage) + Send + Sync,
{
    fn forward(&self, message: SessionMessage) {
        self(message)
    }
}

pub type InboundReceiver = mpsc::UnboundedReceiver<SessionMessage>;
pub type OutboundSender = mpsc::UnboundedSender<Outbound>;
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Backend adapter that queues inbound messages for a separate backend task.
pub struct ChannelBackend {
    sender: mpsc::UnboundedSender<SessionMessage>,
}

impl ChannelBackend {
    /// Create the backend and the receiver its consumer reads from.
    pub fn new() -> (Self, InboundReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Backend for ChannelBackend {
    fn forward(&self, message: SessionMessage) {
        if let Err(mpsc::error::SendError(message)) = self.sender.send(message) {
            log::warn!(
                "Backend is gone, dropping message from frontend session {}",
                message.session_id
            );
        }
    }
}

/// Create the channel a backend uses to push [`Outbound`] triggers.
pub fn outbound_channel() -> (OutboundSender, OutboundReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod wire_format {
        use super::*;

        #[test]
        fn session_message_uses_camel_case() {
            let message = SessionMessage::new("A", "ping");
            let value = serde_json::to_value(&message).unwrap();
            assert_eq!(value, json!({"sessionId": "A", "text": "ping"}));
        }

        #[test]
        fn deliver_trigger_shape() {
            let parsed: Outbound =
                serde_json::from_value(json!({"type": "deliver", "sessionId": "A", "text": "hi"}))
                    .unwrap();
            assert_eq!(parsed, Outbound::Deliver(SessionMessage::new("A", "hi")));
        }

        #[test]
        fn broadcast_trigger_shape() {
            let trigger = Outbound::Broadcast {
                text: "hi".to_string(),
            };
            let value = serde_json::to_value(&trigger).unwrap();
            assert_eq!(value, json!({"type": "broadcast", "text": "hi"}));
        }

        #[test]
        fn unknown_trigger_type_is_rejected() {
            let result = serde_json::from_value::<Outbound>(json!({"type": "shout", "text": "hi"}));
            assert!(result.is_err());
        }
    }

    mod channel_backend {
        use super::*;

        #[tokio::test]
        async fn forward_reaches_receiver_unmodified() {
            let (backend, mut rx) = ChannelBackend::new();
            backend.forward(SessionMessage::new("A", "ping"));

            let received = rx.recv().await.unwrap();
            assert_eq!(received, SessionMessage::new("A", "ping"));
        }

        #[tokio::test]
        async fn forward_preserves_order() {
            let (backend, mut rx) = ChannelBackend::new();
            for n in 1..=3 {
                backend.forward(SessionMessage::new("A", format!("m{}", n)));
            }

            assert_eq!(rx.recv().await.unwrap().text, "m1");
            assert_eq!(rx.recv().await.unwrap().text, "m2");
            assert_eq!(rx.recv().await.unwrap().text, "m3");
        }

        #[test]
        fn forward_with_dropped_receiver_does_not_panic() {
            let (backend, rx) = ChannelBackend::new();
            drop(rx);
            backend.forward(SessionMessage::new("A", "lost"));
        }
    }

    #[test]
    fn closures_are_backends() {
        let seen = std::sync::Mutex::new(Vec::new());
        let backend = |message: SessionMessage| seen.lock().unwrap().push(message);
        backend.forward(SessionMessage::new("A", "x"));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
