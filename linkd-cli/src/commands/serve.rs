//! linkd serve: run the session daemon in the foreground
//!
//! The daemon stops on Ctrl-C or SIGTERM. On the way out every session owner
//! receives `Release` and the socket file is removed.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use linkd_server::{LinkServer, ServerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::LinkdConfig;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Unix socket to listen on (overrides the config file)
    #[arg(short, long)]
    pub socket: Option<PathBuf>,
}

/// Run the serve command
pub async fn run(args: ServeArgs, config: &LinkdConfig) -> Result<()> {
    let server_config = server_config(&args, config);
    info!(socket = %server_config.socket_path.display(), "starting linkd");

    let server = LinkServer::new(server_config);
    let token = server.shutdown_token();
    tokio::spawn(stop_on_signal(token));

    server.run().await.map_err(Into::into)
}

fn server_config(args: &ServeArgs, config: &LinkdConfig) -> ServerConfig {
    let socket_path = args
        .socket
        .clone()
        .unwrap_or_else(|| config.server.socket_path.clone());
    ServerConfig::new(socket_path)
}

async fn stop_on_signal(token: CancellationToken) {
    wait_for_signal().await;
    info!("shutdown requested");
    token.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM");
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_flag_overrides_config() {
        let config = LinkdConfig::default();
        let args = ServeArgs {
            socket: Some(PathBuf::from("/tmp/flag.sock")),
        };
        assert_eq!(
            server_config(&args, &config).socket_path,
            PathBuf::from("/tmp/flag.sock")
        );
    }

    #[test]
    fn config_socket_used_without_flag() {
        let mut config = LinkdConfig::default();
        config.server.socket_path = PathBuf::from("/tmp/config.sock");
        let args = ServeArgs { socket: None };
        assert_eq!(
            server_config(&args, &config).socket_path,
            PathBuf::from("/tmp/config.sock")
        );
    }
}
