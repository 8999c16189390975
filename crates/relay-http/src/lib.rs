//! HTTP server for browser access to the relay.
//!
//! Serves the WebSocket endpoint at [`RELAY_PATH`] and a small trigger API
//! that lets an external backend send to one or all sessions.

mod routes;
mod state;
mod websocket;

use axum::{
    routing::{get, post},
    Router,
};
use relay_core::RelayError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};

pub use routes::{BroadcastRequest, BroadcastResponse, DeliverResponse, SessionsResponse};
pub use state::SharedState;
pub use websocket::{DEFAULT_QUEUE_SIZE, RELAY_PATH};

/// Handle to a running HTTP server.
pub struct HttpServerHandle {
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<std::thread::JoinHandle<()>>,
}

impl HttpServerHandle {
    /// Address the server is bound to. Useful when started on port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Check if the server is running.
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }

    /// Stop the server gracefully.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.join();
        }
    }
}

impl Default for HttpServerHandle {
    fn default() -> Self {
        Self {
            local_addr: None,
            shutdown_tx: None,
            task: None,
        }
    }
}

/// Build the router: the relay endpoint plus the trigger API.
pub fn router(state: Arc<SharedState>) -> Router {
    Router::new()
        .route(RELAY_PATH, get(websocket::ws_handler))
        .route("/api/deliver", post(routes::deliver_handler))
        .route("/api/broadcast", post(routes::broadcast_handler))
        .route("/api/sessions", get(routes::sessions_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Start the HTTP server on the given host and port.
///
/// The server runs in a separate thread with its own tokio runtime. This
/// call waits until the listener is bound, so an unusable address is
/// reported here as [`RelayError::HandshakeUnavailable`] rather than lost
/// in the background thread.
pub fn start(
    state: Arc<SharedState>,
    host: &str,
    port: u16,
) -> Result<HttpServerHandle, RelayError> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| RelayError::HandshakeUnavailable(format!("Invalid address: {}", e)))?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<SocketAddr, String>>();

    let task = std::thread::spawn(move || {
        // Create a new tokio runtime for the HTTP server
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                let _ = ready_tx.send(Err(format!("Failed to create tokio runtime: {}", e)));
                return;
            }
        };

        rt.block_on(async move {
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("Failed to bind {}: {}", addr, e)));
                    return;
                }
            };
            let local_addr = match listener.local_addr() {
                Ok(a) => a,
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("Failed to read bound address: {}", e)));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(local_addr));

            log::info!("Relay listening on ws://{}{}", local_addr, RELAY_PATH);

            // Run with graceful shutdown
            axum::serve(listener, router(state))
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                    log::info!("HTTP server shutting down");
                })
                .await
                .ok();
        });
    });

    match ready_rx.recv() {
        Ok(Ok(local_addr)) => Ok(HttpServerHandle {
            local_addr: Some(local_addr),
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }),
        Ok(Err(reason)) => {
            let _ = task.join();
            Err(RelayError::HandshakeUnavailable(reason))
        }
        Err(_) => {
            let _ = task.join();
            Err(RelayError::HandshakeUnavailable(
                "HTTP server thread exited before binding".to_string(),
            ))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
