//! Live frontend sessions and the registry that tracks them.

mod registry;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use registry::SessionRegistry;
pub use state::{Session, SessionHandle, SessionId, SessionState};
