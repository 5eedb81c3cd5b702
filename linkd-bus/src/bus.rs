//! The transport seam
//!
//! The session registry never touches sockets. It asks a [`Bus`] to send
//! frames, to route calls for an object path to it, and to tell it when a peer
//! disappears.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::path::ObjectPath;

/// Handle of a liveness watch registered with [`Bus::add_disconnect_watch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WatchId(pub u64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// Operations the daemon needs from its IPC transport
///
/// Every method returns without waiting on a remote peer. `send` queues the
/// frame and reports only local failures such as an unknown destination.
pub trait Bus: Send + Sync {
    /// Queue a frame for delivery
    fn send(&self, message: Message) -> Result<()>;

    /// Start routing calls for `interface` at `path` to the daemon
    fn register_object(&self, path: &ObjectPath, interface: &str) -> Result<()>;

    /// Stop routing calls for `interface` at `path`
    ///
    /// Returns `false` if nothing was registered there.
    fn unregister_object(&self, path: &ObjectPath, interface: &str) -> bool;

    /// Whether `interface` is currently registered at `path`
    fn is_registered(&self, path: &ObjectPath, interface: &str) -> bool;

    /// Ask to be told when peer `name` leaves the bus
    ///
    /// When it does, the transport delivers the returned id back to the
    /// daemon's dispatcher exactly once.
    fn add_disconnect_watch(&self, name: &str) -> Result<WatchId>;

    /// Cancel a watch. Returns `false` if it was already gone.
    fn remove_watch(&self, id: WatchId) -> bool;
}
