//! Error types for linkd-core

use linkd_bus::{BusName, ObjectPath};
use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Namespace for error names sent back on the bus
pub const ERROR_PREFIX: &str = "net.linkd.Error";

/// Errors returned synchronously by session operations
///
/// None of these are retried internally; they become the failed reply of the
/// call that caused them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Missing or malformed argument
    #[error("Invalid arguments: {0}")]
    InvalidArgument(String),

    /// A session with the same derived path is already registered
    #[error("Session already exists: {0}")]
    AlreadyExists(ObjectPath),

    #[error("Session not found: {0}")]
    NotFound(String),

    /// Requester is not the session's owner
    #[error("Permission denied: {requester} does not own {path}")]
    PermissionDenied {
        path: ObjectPath,
        requester: BusName,
    },

    /// Allocation failed while building session state
    #[error("Out of memory: {0}")]
    ResourceExhausted(String),

    /// No daemon object at the called path
    #[error("No such object: {0}")]
    UnknownObject(String),

    #[error("Unknown method {interface}.{member}")]
    UnknownMethod { interface: String, member: String },
}

impl SessionError {
    /// Stable error name used in `error` frames
    pub fn error_name(&self) -> String {
        let suffix = match self {
            SessionError::InvalidArgument(_) => "InvalidArguments",
            SessionError::AlreadyExists(_) => "AlreadyExists",
            SessionError::NotFound(_) => "NotFound",
            SessionError::PermissionDenied { .. } => "PermissionDenied",
            SessionError::ResourceExhausted(_) => "OutOfMemory",
            SessionError::UnknownObject(_) => "UnknownObject",
            SessionError::UnknownMethod { .. } => "UnknownMethod",
        };
        format!("{ERROR_PREFIX}.{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_displays_reason() {
        let error = SessionError::InvalidArgument("missing notify path".to_string());
        assert!(error.to_string().contains("missing notify path"));
        assert_eq!(error.error_name(), "net.linkd.Error.InvalidArguments");
    }

    #[test]
    fn permission_denied_names_requester_and_path() {
        let error = SessionError::PermissionDenied {
            path: ObjectPath::new("/sessions/app").unwrap(),
            requester: ":1.9".to_string(),
        };
        let text = error.to_string();
        assert!(text.contains(":1.9"));
        assert!(text.contains("/sessions/app"));
        assert_eq!(error.error_name(), "net.linkd.Error.PermissionDenied");
    }

    #[test]
    fn resource_exhausted_maps_to_out_of_memory() {
        let error = SessionError::ResourceExhausted("bearer list".to_string());
        assert_eq!(error.error_name(), "net.linkd.Error.OutOfMemory");
    }

    #[test]
    fn every_variant_has_a_distinct_name() {
        let path = ObjectPath::new("/sessions/x").unwrap();
        let errors = [
            SessionError::InvalidArgument(String::new()),
            SessionError::AlreadyExists(path.clone()),
            SessionError::NotFound(String::new()),
            SessionError::PermissionDenied {
                path,
                requester: String::new(),
            },
            SessionError::ResourceExhausted(String::new()),
            SessionError::UnknownObject(String::new()),
            SessionError::UnknownMethod {
                interface: String::new(),
                member: String::new(),
            },
        ];
        let mut names: Vec<_> = errors.iter().map(SessionError::error_name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), errors.len());
    }
}
