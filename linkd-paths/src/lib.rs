//! XDG Base Directory paths for linkd.
//!
//! The daemon and its CLI use XDG paths on every platform rather than
//! platform-native locations.

use std::path::PathBuf;

const APP: &str = "linkd";
const SOCKET_FILE: &str = "linkd.sock";

/// Get the linkd config directory.
///
/// Returns `$XDG_CONFIG_HOME/linkd` if set, otherwise `~/.config/linkd`.
///
/// # Examples
///
/// ```
/// use linkd_paths::config_dir;
///
/// let config_file = config_dir().join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the linkd data directory.
///
/// Returns `$XDG_DATA_HOME/linkd` if set, otherwise `~/.local/share/linkd`.
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// Get the linkd runtime directory, if the session has one.
///
/// Returns `$XDG_RUNTIME_DIR/linkd`. There is no fallback under `$HOME`:
/// runtime files belong in a directory the login session cleans up.
pub fn runtime_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_RUNTIME_DIR").map(|dir| PathBuf::from(dir).join(APP))
}

/// Default location of the daemon's listening socket.
///
/// `$XDG_RUNTIME_DIR/linkd/linkd.sock`, or the data directory when no runtime
/// directory exists.
pub fn default_socket_path() -> PathBuf {
    socket_path_in(runtime_dir(), data_dir())
}

fn socket_path_in(runtime: Option<PathBuf>, data: PathBuf) -> PathBuf {
    runtime.unwrap_or(data).join(SOCKET_FILE)
}

fn xdg_dir(var: &str, home_relative: &str) -> PathBuf {
    resolve(std::env::var_os(var).map(PathBuf::from), dirs::home_dir(), home_relative)
}

fn resolve(xdg: Option<PathBuf>, home: Option<PathBuf>, home_relative: &str) -> PathBuf {
    match (xdg, home) {
        (Some(xdg), _) => xdg.join(APP),
        (None, Some(home)) => home.join(home_relative).join(APP),
        (None, None) => PathBuf::from(home_relative).join(APP),
    }
}
