//! Server error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the linkd server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the listening socket
    #[error("failed to bind to {}: {source}", path.display())]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to prepare the socket directory or clean up a stale socket
    #[error("socket setup failed for {}: {source}", path.display())]
    SocketSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
