//! Owner liveness
//!
//! Every session holds exactly one disconnect watch on its owner's bus name.
//! When the owner goes away the transport reports the watch id back, and the
//! registry tears down every session of that owner without asking anyone's
//! permission and without trying to notify the departed owner.

use std::fmt;
use std::sync::Arc;

use linkd_bus::{Bus, BusName, ObjectPath, WatchId};
use tracing::debug;

use crate::error::{Result, SessionError};

/// A registered disconnect watch, owned by one session
///
/// Releasing it cancels the watch on the bus. Release happens at most once;
/// dropping an unreleased watch releases it.
pub struct LivenessWatch {
    id: WatchId,
    owner: BusName,
    bus: Arc<dyn Bus>,
    active: bool,
}

impl LivenessWatch {
    pub fn id(&self) -> WatchId {
        self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Cancel the watch. Returns `false` if it was already released.
    pub fn release(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        if !self.bus.remove_watch(self.id) {
            debug!(watch = %self.id, owner = %self.owner, "watch already gone from bus");
        }
        true
    }
}

impl Drop for LivenessWatch {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for LivenessWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LivenessWatch")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("active", &self.active)
            .finish()
    }
}

/// Hands out liveness watches on session owners
pub struct LivenessMonitor {
    bus: Arc<dyn Bus>,
}

impl LivenessMonitor {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }

    /// Register a disconnect watch on `owner`
    pub fn watch(&self, owner: &str) -> Result<LivenessWatch> {
        let id = self.bus.add_disconnect_watch(owner).map_err(|e| {
            SessionError::InvalidArgument(format!("cannot watch owner {owner}: {e}"))
        })?;
        debug!(watch = %id, owner, "watching session owner");
        Ok(LivenessWatch {
            id,
            owner: owner.to_string(),
            bus: Arc::clone(&self.bus),
            active: true,
        })
    }
}

/// Result of handling an owner disconnect
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DisconnectResult {
    /// Owner that left, if the fired watch was still known
    pub owner: Option<BusName>,
    /// Sessions that were torn down
    pub cleanups: Vec<ObjectPath>,
}

impl DisconnectResult {
    pub fn is_empty(&self) -> bool {
        self.cleanups.is_empty()
    }
}
