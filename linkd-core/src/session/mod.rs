//! Session management

pub mod attributes;
pub mod liveness;
pub mod registry;
pub mod state;

// Re-export key types for convenience
pub use attributes::{SessionAttribute, SessionSettings, keys};
pub use liveness::{DisconnectResult, LivenessMonitor, LivenessWatch};
pub use registry::{SESSION_PREFIX, SessionRegistry, session_path_for};
pub use state::Session;
