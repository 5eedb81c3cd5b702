//! In-process bus
//!
//! MemoryBus keeps every frame it is asked to send in a Vec, in order, so
//! callers can assert on exactly what a peer would have observed. Peers can be
//! marked unreachable or disconnected to exercise failure and liveness paths.

use std::collections::HashSet;

use parking_lot::Mutex;
use tracing::debug;

use crate::bus::{Bus, WatchId};
use crate::error::{BusError, Result};
use crate::message::Message;
use crate::path::{BusName, ObjectPath};
use crate::tables::{ObjectTable, WatchTable};

/// Recording, in-process implementation of [`Bus`]
#[derive(Debug, Default)]
pub struct MemoryBus {
    sent: Mutex<Vec<Message>>,
    objects: Mutex<ObjectTable>,
    watches: Mutex<WatchTable>,
    unreachable: Mutex<HashSet<BusName>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every frame sent so far, oldest first
    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().clone()
    }

    /// Drain the recorded frames
    pub fn take_sent(&self) -> Vec<Message> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Frames addressed to `name`, oldest first
    pub fn sent_to(&self, name: &str) -> Vec<Message> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.destination() == Some(name))
            .cloned()
            .collect()
    }

    /// Make every later `send` to `name` fail
    pub fn set_unreachable(&self, name: &str) {
        self.unreachable.lock().insert(name.to_string());
    }

    /// Simulate peer `name` leaving the bus
    ///
    /// Returns the watches that fire, in registration order. They remain
    /// registered until their owner removes them.
    pub fn disconnect_peer(&self, name: &str) -> Vec<WatchId> {
        self.set_unreachable(name);
        let fired = self.watches.lock().watching(name);
        debug!(peer = name, watches = fired.len(), "peer disconnected");
        fired
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn watch_count(&self) -> usize {
        self.watches.lock().len()
    }

    /// Live watches on `name`
    pub fn watches_for(&self, name: &str) -> Vec<WatchId> {
        self.watches.lock().watching(name)
    }
}

impl Bus for MemoryBus {
    fn send(&self, message: Message) -> Result<()> {
        if let Some(destination) = message.destination()
            && self.unreachable.lock().contains(destination)
        {
            return Err(BusError::PeerUnreachable(destination.to_string()));
        }
        self.sent.lock().push(message);
        Ok(())
    }

    fn register_object(&self, path: &ObjectPath, interface: &str) -> Result<()> {
        self.objects.lock().register(path, interface)
    }

    fn unregister_object(&self, path: &ObjectPath, interface: &str) -> bool {
        self.objects.lock().unregister(path, interface)
    }

    fn is_registered(&self, path: &ObjectPath, interface: &str) -> bool {
        self.objects.lock().contains(path, interface)
    }

    fn add_disconnect_watch(&self, name: &str) -> Result<WatchId> {
        Ok(self.watches.lock().add(name))
    }

    fn remove_watch(&self, id: WatchId) -> bool {
        self.watches.lock().remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::interfaces;

    fn release_to(name: &str) -> Message {
        Message::notify(
            name,
            ObjectPath::new("/notify").unwrap(),
            interfaces::NOTIFICATION,
            "Release",
            vec![],
        )
    }

    #[test]
    fn records_frames_in_order() {
        let bus = MemoryBus::new();
        bus.send(release_to(":1.1")).unwrap();
        bus.send(release_to(":1.2")).unwrap();

        let sent = bus.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].destination(), Some(":1.1"));
        assert_eq!(bus.sent_to(":1.2").len(), 1);
    }

    #[test]
    fn take_sent_drains() {
        let bus = MemoryBus::new();
        bus.send(release_to(":1.1")).unwrap();
        assert_eq!(bus.take_sent().len(), 1);
        assert!(bus.sent().is_empty());
    }

    #[test]
    fn unreachable_peer_rejects_sends() {
        let bus = MemoryBus::new();
        bus.set_unreachable(":1.4");

        let err = bus.send(release_to(":1.4")).unwrap_err();
        assert!(matches!(err, BusError::PeerUnreachable(name) if name == ":1.4"));
        assert!(bus.sent().is_empty());
    }

    #[test]
    fn disconnect_fires_watches_without_removing_them() {
        let bus = MemoryBus::new();
        let w1 = bus.add_disconnect_watch(":1.5").unwrap();
        let w2 = bus.add_disconnect_watch(":1.5").unwrap();
        bus.add_disconnect_watch(":1.6").unwrap();

        assert_eq!(bus.disconnect_peer(":1.5"), vec![w1, w2]);
        assert_eq!(bus.watch_count(), 3);

        assert!(bus.remove_watch(w1));
        assert!(bus.remove_watch(w2));
        assert!(bus.watches_for(":1.5").is_empty());
    }

    #[test]
    fn object_registration_round_trip() {
        let bus = MemoryBus::new();
        let path = ObjectPath::new("/sessions/a").unwrap();
        bus.register_object(&path, interfaces::SESSION).unwrap();
        assert!(bus.is_registered(&path, interfaces::SESSION));
        assert!(bus.register_object(&path, interfaces::SESSION).is_err());
        assert!(bus.unregister_object(&path, interfaces::SESSION));
        assert_eq!(bus.object_count(), 0);
    }
}
