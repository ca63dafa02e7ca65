//! Shared state and messaging between the session and the presentation layer
//!
//! The session publishes [`UiState`] snapshots and accepts
//! [`SessionCommand`]s; nothing else crosses the boundary.

pub mod messages;
pub mod state;

pub use messages::SessionCommand;
pub use state::{UiState, CAPTURED_IMAGE_INDEX, INITIAL_PROMPT};
