//! Error types for bus operations.

use thiserror::Error;

use crate::path::BusName;

/// Result type alias for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors that can occur while talking to the bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The destination peer is not connected (or never was).
    #[error("peer {0} is not reachable")]
    PeerUnreachable(BusName),

    /// An object is already registered at this path for this interface.
    #[error("object {path} already implements {interface}")]
    ObjectExists { path: String, interface: String },

    /// A string that does not form a valid object path.
    #[error("invalid object path: '{0}'")]
    InvalidObjectPath(String),

    /// A frame could not be understood.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The bus has been shut down.
    #[error("bus closed")]
    Closed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_unreachable_names_the_peer() {
        let error = BusError::PeerUnreachable(":1.7".to_string());
        assert_eq!(error.to_string(), "peer :1.7 is not reachable");
    }

    #[test]
    fn object_exists_displays_path_and_interface() {
        let error = BusError::ObjectExists {
            path: "/sessions/a".to_string(),
            interface: "net.linkd.Session".to_string(),
        };
        assert!(error.to_string().contains("/sessions/a"));
        assert!(error.to_string().contains("net.linkd.Session"));
    }

    #[test]
    fn converts_from_json_error() {
        let json_error = serde_json::from_str::<u32>("nope").unwrap_err();
        let error: BusError = json_error.into();
        assert!(matches!(error, BusError::Json(_)));
    }
}
