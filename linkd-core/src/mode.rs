//! Global session mode
//!
//! When session mode is on, connectivity is driven only by sessions. Turning
//! it on therefore drops every connection that was brought up outside a
//! session. Turning it off, or setting the mode it already has, does nothing
//! beyond recording the value.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::connectivity::ConnectivityManager;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionMode {
    #[default]
    Disabled,
    Enabled,
}

impl SessionMode {
    pub fn is_enabled(self) -> bool {
        self == SessionMode::Enabled
    }
}

impl From<bool> for SessionMode {
    fn from(enabled: bool) -> Self {
        if enabled {
            SessionMode::Enabled
        } else {
            SessionMode::Disabled
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Disabled => write!(f, "disabled"),
            SessionMode::Enabled => write!(f, "enabled"),
        }
    }
}

/// Holds the session mode flag and runs its side effect
pub struct SessionModeController {
    mode: SessionMode,
    connectivity: Arc<dyn ConnectivityManager>,
}

impl SessionModeController {
    /// Starts disabled
    pub fn new(connectivity: Arc<dyn ConnectivityManager>) -> Self {
        Self {
            mode: SessionMode::Disabled,
            connectivity,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_enabled(&self) -> bool {
        self.mode.is_enabled()
    }

    /// Set the mode. Returns whether it changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let requested = SessionMode::from(enabled);
        if requested == self.mode {
            return false;
        }
        self.mode = requested;
        info!(mode = %requested, "session mode changed");

        if requested.is_enabled() {
            self.connectivity.disconnect_all();
        }
        true
    }
}
