//! WebSocket handler for frontend sessions.
//!
//! Clients connect to `/relay`. Every connection becomes a session in the
//! relay: text frames are forwarded to the backend, and anything the relay
//! sends to the session is written back to the socket in order.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use relay_core::{Relay, Session, SessionHandle, SessionId, SessionState, TransportError};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};

use super::SharedState;

/// The single path the relay endpoint is served on.
pub const RELAY_PATH: &str = "/relay";

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_QUEUE_SIZE: usize = 64;

/// Session handle backed by a WebSocket writer task.
///
/// Sends are queued, never awaited, so the relay can fan out without being
/// held up by one slow client.
struct WsSession {
    id: SessionId,
    outbound: mpsc::Sender<String>,
    close_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl WsSession {
    fn new(id: SessionId, outbound: mpsc::Sender<String>, close_tx: oneshot::Sender<()>) -> Self {
        Self {
            id,
            outbound,
            close_tx: Mutex::new(Some(close_tx)),
        }
    }
}

impl SessionHandle for WsSession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.outbound
            .try_send(text.to_string())
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => TransportError::Saturated,
                mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
            })
    }

    fn close(&self) {
        let close_tx = self
            .close_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = close_tx {
            let _ = tx.send(());
        }
    }
}

/// Drives the relay hooks for one connection according to its lifecycle.
///
/// Dropping the connection closes it, so the session is unregistered even
/// when the connection task is cancelled.
struct Connection {
    relay: Arc<Relay>,
    session: Session,
    state: SessionState,
}

impl Connection {
    fn open(relay: Arc<Relay>, session: Session) -> Self {
        let mut state = SessionState::Connecting;
        state.advance(SessionState::Open);
        relay.on_open(Arc::clone(&session));
        Self {
            relay,
            session,
            state,
        }
    }

    fn message(&self, text: String) {
        if self.state.accepts_messages() {
            self.relay.on_message(&self.session, text);
        }
    }

    fn error(&mut self, error: &dyn std::fmt::Display) {
        if self.state.advance(SessionState::Error) {
            self.relay.on_error(&self.session, error);
        }
    }

    fn close(&mut self, reason: &str) {
        if self.state.advance(SessionState::Closed) {
            self.relay.on_close(&self.session, reason);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close("connection dropped");
    }
}

/// Handler for GET /relay
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<SharedState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<SharedState>) {
    let (sender, mut receiver) = socket.split();

    let (outbound_tx, outbound_rx) = mpsc::channel(state.queue_size);
    let (close_tx, close_rx) = oneshot::channel();
    let session: Session = Arc::new(WsSession::new(SessionId::new(), outbound_tx, close_tx));

    // Writer starts before the open hook so the ack is the first frame out.
    let writer = tokio::spawn(write_loop(sender, outbound_rx, close_rx));
    let mut connection = Connection::open(Arc::clone(&state.relay), Arc::clone(&session));

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => connection.message(text.as_str().to_owned()),
            Ok(Message::Binary(data)) => {
                log::debug!(
                    "Ignoring {} byte binary frame from frontend session {}",
                    data.len(),
                    session.id()
                );
            }
            Ok(Message::Close(frame)) => {
                let reason = match frame {
                    Some(frame) if frame.reason.as_str().is_empty() => format!("code {}", frame.code),
                    Some(frame) => format!("code {}: {}", frame.code, frame.reason.as_str()),
                    None => "closed by client".to_string(),
                };
                connection.close(&reason);
                break;
            }
            // Ping/pong are answered by axum.
            Ok(_) => {}
            Err(e) => {
                connection.error(&e);
                connection.close("transport error");
                break;
            }
        }
    }

    connection.close("connection ended");
    session.close();
    let _ = writer.await;
}

/// Write queued messages to the socket until the session is closed or the
/// client goes away.
async fn write_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<String>,
    mut close_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut close_rx => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            next = outbound_rx.recv() => match next {
                Some(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break; // Client disconnected
                    }
                }
                None => break,
            },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::SessionMessage;

    fn ws_session(capacity: usize) -> (WsSession, mpsc::Receiver<String>, oneshot::Receiver<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let (close_tx, close_rx) = oneshot::channel();
        (WsSession::new(SessionId::from("A"), tx, close_tx), rx, close_rx)
    }

    mod ws_session {
        use super::*;

        #[tokio::test]
        async fn send_text_queues_in_order() {
            let (session, mut rx, _close) = ws_session(8);
            session.send_text("one").unwrap();
            session.send_text("two").unwrap();

            assert_eq!(rx.recv().await.unwrap(), "one");
            assert_eq!(rx.recv().await.unwrap(), "two");
        }

        #[test]
        fn full_queue_reports_saturated() {
            let (session, _rx, _close) = ws_session(1);
            session.send_text("one").unwrap();
            assert_eq!(session.send_text("two"), Err(TransportError::Saturated));
        }

        #[test]
        fn dropped_writer_reports_closed() {
            let (session, rx, _close) = ws_session(4);
            drop(rx);
            assert_eq!(session.send_text("late"), Err(TransportError::Closed));
        }

        #[tokio::test]
        async fn close_signals_writer_once() {
            let (session, _rx, close_rx) = ws_session(4);
            session.close();
            session.close();
            assert!(close_rx.await.is_ok());
        }
    }

    mod connection {
        use super::*;

        fn relay() -> Arc<Relay> {
            Arc::new(Relay::new(Arc::new(|_: SessionMessage| {})))
        }

        #[test]
        fn open_registers_and_drop_unregisters() {
            let relay = relay();
            let (session, mut rx, _close) = ws_session(4);
            let session: Session = Arc::new(session);

            let connection = Connection::open(Arc::clone(&relay), session);
            assert_eq!(relay.session_count(), 1);
            assert_eq!(rx.try_recv().unwrap(), "Opened frontend session A");

            drop(connection);
            assert_eq!(relay.session_count(), 0);
        }

        #[test]
        fn messages_ignored_after_close() {
            let forwarded = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&forwarded);
            let relay = Arc::new(Relay::new(Arc::new(move |m: SessionMessage| {
                sink.lock().unwrap().push(m)
            })));
            let (session, _rx, _close) = ws_session(4);

            let mut connection = Connection::open(relay, Arc::new(session));
            connection.message("before".to_string());
            connection.close("normal");
            connection.message("after".to_string());

            let forwarded = forwarded.lock().unwrap();
            assert_eq!(forwarded.len(), 1);
            assert_eq!(forwarded[0].text, "before");
        }

        #[test]
        fn error_then_close_unregisters_once() {
            let relay = relay();
            let (session, _rx, _close) = ws_session(4);

            let mut connection = Connection::open(Arc::clone(&relay), Arc::new(session));
            connection.error(&"reset by peer");
            assert_eq!(relay.session_count(), 1);
            assert_eq!(connection.state, SessionState::Error);

            connection.close("transport error");
            assert_eq!(relay.session_count(), 0);
            assert!(connection.state.is_closed());
        }
    }
}
