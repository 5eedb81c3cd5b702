//! linkd-server - Unix socket transport for the linkd daemon
//!
//! Peers connect to a Unix socket and exchange newline-delimited JSON frames.
//! Each connection gets a unique bus name; one dispatcher task owns the
//! session registry and serves every peer in arrival order.
//!
//! ```text
//! peer ──► connection task ──┐
//! peer ──► connection task ──┼──► mpsc ──► Dispatcher (SessionContext)
//! peer ──► connection task ──┘                 │
//!    ▲                                         │
//!    └──────── SocketBus outbound queues ◄─────┘
//! ```

mod bus;
pub mod codec;
pub mod connection;
pub mod dispatch;
mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use linkd_core::{ConnectivityManager, NoopConnectivity, SessionContext};
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

pub use bus::{PeerReceiver, SocketBus};
pub use dispatch::{Dispatcher, INBOUND_CAPACITY, Inbound};
pub use error::ServerError;

/// The linkd daemon
pub struct LinkServer {
    config: ServerConfig,
    connectivity: Arc<dyn ConnectivityManager>,
    shutdown: CancellationToken,
}

impl LinkServer {
    /// Create a server with no connectivity manager attached
    pub fn new(config: ServerConfig) -> Self {
        Self::with_connectivity(config, Arc::new(NoopConnectivity))
    }

    pub fn with_connectivity(
        config: ServerConfig,
        connectivity: Arc<dyn ConnectivityManager>,
    ) -> Self {
        Self {
            config,
            connectivity,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Token that stops the server when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bind the socket and serve until the shutdown token is cancelled
    ///
    /// On the way out every session is released, queued frames are flushed
    /// to their peers and the socket file is removed.
    pub async fn run(self) -> Result<(), ServerError> {
        let path = self.config.socket_path.clone();
        let listener = bind(&path)?;
        info!(socket = %path.display(), "linkd listening");

        let bus = Arc::new(SocketBus::new());
        let ctx = SessionContext::new(bus.clone(), Arc::clone(&self.connectivity));
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let dispatcher = tokio::spawn(
            Dispatcher::new(ctx, inbound_rx, self.shutdown.clone()).run(),
        );

        let tracker = TaskTracker::new();
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        tracker.spawn(connection::handle_connection(
                            stream,
                            bus.clone(),
                            inbound_tx.clone(),
                            self.shutdown.clone(),
                        ));
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
            }
        }

        info!("shutting down");
        drop(inbound_tx);
        if let Err(e) = dispatcher.await {
            warn!(error = %e, "dispatcher task failed");
        }
        bus.close_all();
        tracker.close();
        tracker.wait().await;

        remove_socket(&path);
        info!("linkd stopped");
        Ok(())
    }
}

fn bind(path: &Path) -> Result<UnixListener, ServerError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| ServerError::SocketSetup {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    if path.exists() {
        debug!(socket = %path.display(), "removing stale socket");
        std::fs::remove_file(path).map_err(|e| ServerError::SocketSetup {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    UnixListener::bind(path).map_err(|e| ServerError::Bind {
        path: path.to_path_buf(),
        source: e,
    })
}

fn remove_socket(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(socket = %path.display(), error = %e, "failed to remove socket");
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Unix socket to listen on
    pub socket_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: linkd_paths::default_socket_path(),
        }
    }
}

impl ServerConfig {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert!(config.socket_path.ends_with("linkd.sock"));
    }

    #[test]
    fn test_link_server_new() {
        let config = ServerConfig::new("/tmp/linkd-test.sock");
        let server = LinkServer::new(config.clone());
        assert_eq!(server.config(), &config);
    }

    #[test]
    fn test_bind_replaces_stale_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("linkd.sock");

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let first = bind(&path).unwrap();
            drop(first);
            assert!(path.exists());
            let _second = bind(&path).unwrap();
        });
    }

    #[test]
    fn test_remove_socket_ignores_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        remove_socket(&dir.path().join("absent.sock"));
    }
}
