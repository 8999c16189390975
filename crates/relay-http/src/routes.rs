//! HTTP route handlers for backend triggers.
//!
//! An external backend can push targeted and broadcast sends over plain
//! HTTP instead of holding an in-process channel:
//!
//! - `POST /api/deliver` with `{"sessionId": "...", "text": "..."}`
//! - `POST /api/broadcast` with `{"text": "..."}`
//! - `GET /api/sessions` lists the live session ids

use axum::{extract::State, response::Json};
use relay_core::{SessionId, SessionMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::SharedState;

/// Request body for broadcast triggers.
#[derive(Deserialize)]
pub struct BroadcastRequest {
    pub text: String,
}

/// Response for targeted sends.
#[derive(Serialize)]
pub struct DeliverResponse {
    /// Whether the text was handed to the session's connection.
    /// Unknown or closed sessions are not an error, just `false`.
    pub delivered: bool,
}

/// Response for broadcasts.
#[derive(Serialize)]
pub struct BroadcastResponse {
    /// Number of sessions that accepted the message.
    pub recipients: usize,
}

#[derive(Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionId>,
}

/// Handler for POST /api/deliver
pub async fn deliver_handler(
    State(state): State<Arc<SharedState>>,
    Json(message): Json<SessionMessage>,
) -> Json<DeliverResponse> {
    log::debug!("HTTP deliver to frontend session {}", message.session_id);
    Json(DeliverResponse {
        delivered: state.relay.deliver(&message),
    })
}

/// Handler for POST /api/broadcast
pub async fn broadcast_handler(
    State(state): State<Arc<SharedState>>,
    Json(request): Json<BroadcastRequest>,
) -> Json<BroadcastResponse> {
    Json(BroadcastResponse {
        recipients: state.relay.broadcast(&request.text),
    })
}

/// Handler for GET /api/sessions
pub async fn sessions_handler(State(state): State<Arc<SharedState>>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.relay.session_ids(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
