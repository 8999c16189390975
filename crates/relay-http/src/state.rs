//! Shared state for the HTTP server.
//!
//! Wraps the Relay and the transport settings needed by HTTP handlers.

use relay_core::Relay;
use std::sync::Arc;

use crate::websocket::DEFAULT_QUEUE_SIZE;

/// Shared state available to all HTTP handlers.
#[derive(Clone)]
pub struct SharedState {
    /// The relay every connection registers with.
    pub relay: Arc<Relay>,
    /// Capacity of each connection's outbound queue.
    pub queue_size: usize,
}

impl SharedState {
    /// Create a new shared state around the given relay.
    pub fn new(relay: Arc<Relay>) -> Self {
        Self {
            relay,
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }

    /// Override the per-connection outbound queue capacity (minimum 1).
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size.max(1);
        self
    }
}
