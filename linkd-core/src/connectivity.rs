//! Hook into the connectivity manager
//!
//! Mapping bearers to network services and actually connecting them is not
//! the registry's job. The registry calls out through [`ConnectivityManager`]
//! for the few things it needs: the live service data shown in full
//! snapshots, the "disconnect everything" side effect of enabling session
//! mode, and per-session connect/disconnect requests.

use std::sync::atomic::{AtomicUsize, Ordering};

use linkd_bus::Dict;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::session::Session;

/// Service data the connectivity manager reports for a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceView {
    /// Bearer in use (e.g. `wifi`)
    pub bearer: String,
    pub online: bool,
    /// Name of the network service
    pub name: String,
    /// Kernel interface name
    pub interface: String,
    pub ipv4: Dict,
    pub ipv6: Dict,
}

/// Operations the registry delegates to the connectivity manager
pub trait ConnectivityManager: Send + Sync {
    /// Disconnect every active service
    fn disconnect_all(&self);

    /// Current service data for `session`, if any is assigned
    fn service_view(&self, _session: &Session) -> Option<ServiceView> {
        None
    }

    /// Bring up connectivity for `session`
    fn connect(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    /// Release connectivity held for `session`
    fn disconnect(&self, _session: &Session) -> Result<()> {
        Ok(())
    }
}

/// Connectivity manager that does nothing
///
/// Used when the daemon runs without a policy engine attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopConnectivity;

impl ConnectivityManager for NoopConnectivity {
    fn disconnect_all(&self) {
        debug!("disconnect_all requested, no connectivity manager attached");
    }
}

/// Recording connectivity manager for tests
///
/// Counts every call and optionally reports a fixed [`ServiceView`].
#[derive(Debug, Default)]
pub struct MockConnectivity {
    disconnect_all_calls: AtomicUsize,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    view: Mutex<Option<ServiceView>>,
}

impl MockConnectivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `view` for every session from now on
    pub fn set_view(&self, view: ServiceView) {
        *self.view.lock() = Some(view);
    }

    pub fn disconnect_all_calls(&self) -> usize {
        self.disconnect_all_calls.load(Ordering::SeqCst)
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

impl ConnectivityManager for MockConnectivity {
    fn disconnect_all(&self) {
        self.disconnect_all_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn service_view(&self, _session: &Session) -> Option<ServiceView> {
        self.view.lock().clone()
    }

    fn connect(&self, _session: &Session) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self, _session: &Session) -> Result<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
