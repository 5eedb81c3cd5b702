use super::types::{LinkdConfig, LogSection, RawLinkdConfig, RawLogConfig, RawServerConfig, ServerSection};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable that relocates the project config directory
pub const PROJECT_CONFIG_DIR_ENV: &str = "LINKD_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<LinkdConfig> {
        Self::load_from(Some(&Self::user_config_path()), &Self::project_config_path())
    }

    /// Load and merge the given files; missing files are skipped
    pub fn load_from(user_path: Option<&Path>, project_path: &Path) -> Result<LinkdConfig> {
        let mut raw = RawLinkdConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user_path
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(user_path)?);
        }

        // Layer 2: Project config
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    /// `$XDG_CONFIG_HOME/linkd/config.toml`
    pub fn user_config_path() -> PathBuf {
        linkd_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with LINKD_PROJECT_CONFIG_DIR (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        match std::env::var_os(PROJECT_CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir).join("config.toml"),
            None => PathBuf::from(".linkd/config.toml"),
        }
    }

    fn read_raw(path: &Path) -> Result<RawLinkdConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawLinkdConfig, overlay: RawLinkdConfig) -> RawLinkdConfig {
        RawLinkdConfig {
            server: RawServerConfig {
                socket_path: overlay.server.socket_path.or(base.server.socket_path),
            },
            log: RawLogConfig {
                filter: overlay.log.filter.or(base.log.filter),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawLinkdConfig) -> LinkdConfig {
        LinkdConfig {
            server: raw
                .server
                .socket_path
                .map(|socket_path| ServerSection { socket_path })
                .unwrap_or_default(),
            log: raw
                .log
                .filter
                .map(|filter| LogSection { filter })
                .unwrap_or_default(),
        }
    }
}
