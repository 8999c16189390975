//! # relay-core
//!
//! Session registry and message routing for the frontend relay.
//!
//! This crate is transport-agnostic and can be driven by:
//! - the WebSocket server in `relay-http`
//! - tests, with in-memory session handles
//!
//! ## Key Concepts
//!
//! - **Session**: one live client connection, addressed by its [`SessionId`]
//! - **Registry**: the concurrency-safe table of live sessions
//! - **Relay**: lifecycle hooks plus targeted and broadcast sends
//! - **Backend**: the external unit that consumes inbound text and answers
//!   with [`Outbound`] triggers

pub mod backend;
pub mod error;
pub mod relay;
pub mod session;

// Re-export commonly used types
pub use backend::{Backend, ChannelBackend, Outbound, SessionMessage};
pub use error::{RelayError, TransportError};
pub use relay::Relay;
pub use session::{Session, SessionHandle, SessionId, SessionRegistry, SessionState};
