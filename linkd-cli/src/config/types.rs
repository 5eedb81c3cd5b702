use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log filter used when neither the config nor `RUST_LOG` sets one
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawLinkdConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub log: RawLogConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    /// Unix socket the daemon listens on
    pub socket_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawLogConfig {
    /// `tracing` filter directive, e.g. `info` or `linkd_core=debug`
    pub filter: Option<String>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LinkdConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    pub socket_path: PathBuf,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            socket_path: linkd_paths::default_socket_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogSection {
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
