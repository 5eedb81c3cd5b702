//! SocketBus: the daemon side of the bus
//!
//! Every connected peer gets a unique `:1.N` name and an outbound queue. The
//! connection task drains that queue onto the socket, so [`Bus::send`] never
//! waits on a peer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use linkd_bus::{
    Bus, BusError, BusName, Message, ObjectPath, ObjectTable, Result, WatchId, WatchTable,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Receiving end of a peer's outbound queue
pub type PeerReceiver = mpsc::UnboundedReceiver<Message>;

/// Bus shared by the dispatcher and every connection task
#[derive(Debug, Default)]
pub struct SocketBus {
    peers: Mutex<HashMap<BusName, mpsc::UnboundedSender<Message>>>,
    objects: Mutex<ObjectTable>,
    watches: Mutex<WatchTable>,
    next_peer: AtomicU64,
    closed: AtomicBool,
}

impl SocketBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a new peer, returning its unique name and outbound queue
    pub fn connect_peer(&self) -> (BusName, PeerReceiver) {
        let n = self.next_peer.fetch_add(1, Ordering::Relaxed) + 1;
        let name = format!(":1.{n}");
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.lock().insert(name.clone(), tx);
        debug!(peer = %name, "peer connected");
        (name, rx)
    }

    /// Forget a peer. Returns the disconnect watches that fire for it.
    ///
    /// The watches stay registered until their holders remove them.
    pub fn disconnect_peer(&self, name: &str) -> Vec<WatchId> {
        if self.peers.lock().remove(name).is_none() {
            return Vec::new();
        }
        let fired = self.watches.lock().watching(name);
        debug!(peer = name, watches = fired.len(), "peer disconnected");
        fired
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.peers.lock().contains_key(name)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.lock().len()
    }

    pub fn watch_count(&self) -> usize {
        self.watches.lock().len()
    }

    /// Drop every outbound queue
    ///
    /// Frames already queued are still delivered; later sends fail.
    pub fn close_all(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let peers = std::mem::take(&mut *self.peers.lock());
        debug!(peers = peers.len(), "closing all peer queues");
    }
}

impl Bus for SocketBus {
    fn send(&self, message: Message) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        let Some(destination) = message.destination().map(str::to_string) else {
            return Err(BusError::MalformedFrame(
                "outbound frame has no destination".to_string(),
            ));
        };
        let peers = self.peers.lock();
        let Some(queue) = peers.get(&destination) else {
            return Err(BusError::PeerUnreachable(destination));
        };
        trace!(peer = %destination, "queueing frame");
        queue
            .send(message)
            .map_err(|_| BusError::PeerUnreachable(destination))
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

    /// Only connected peers can be watched; a peer that already left has
    /// nothing left to fire.
    fn add_disconnect_watch(&self, name: &str) -> Result<WatchId> {
        let peers = self.peers.lock();
        if !peers.contains_key(name) {
            return Err(BusError::PeerUnreachable(name.to_string()));
        }
        Ok(self.watches.lock().add(name))
    }

    fn remove_watch(&self, id: WatchId) -> bool {
        self.watches.lock().remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkd_bus::interfaces;

    fn hello(name: &str) -> Message {
        Message::notify(name, ObjectPath::root(), interfaces::BUS, "Hello", vec![])
    }

    #[test]
    fn peers_get_unique_names() {
        let bus = SocketBus::new();
        let (a, _rx_a) = bus.connect_peer();
        let (b, _rx_b) = bus.connect_peer();
        assert_eq!(a, ":1.1");
        assert_eq!(b, ":1.2");
        assert_eq!(bus.peer_count(), 2);
    }

    #[test]
    fn send_queues_for_destination() {
        let bus = SocketBus::new();
        let (name, mut rx) = bus.connect_peer();

        bus.send(hello(&name)).unwrap();
        assert_eq!(rx.try_recv().unwrap().member(), Some("Hello"));
    }

    #[test]
    fn send_to_unknown_peer_fails() {
        let bus = SocketBus::new();
        let err = bus.send(hello(":1.9")).unwrap_err();
        assert!(matches!(err, BusError::PeerUnreachable(name) if name == ":1.9"));
    }

    #[test]
    fn watches_require_connected_peer() {
        let bus = SocketBus::new();
        assert!(bus.add_disconnect_watch(":1.1").is_err());

        let (name, _rx) = bus.connect_peer();
        let id = bus.add_disconnect_watch(&name).unwrap();
        assert_eq!(bus.disconnect_peer(&name), vec![id]);
        assert!(!bus.is_connected(&name));
        // fired watches remain until removed
        assert_eq!(bus.watch_count(), 1);
        assert!(bus.remove_watch(id));
        assert!(bus.disconnect_peer(&name).is_empty());
    }

    #[test]
    fn close_all_drains_then_refuses() {
        let bus = SocketBus::new();
        let (name, mut rx) = bus.connect_peer();
        bus.send(hello(&name)).unwrap();

        bus.close_all();
        assert!(rx.try_recv().is_ok());
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        assert!(matches!(bus.send(hello(&name)), Err(BusError::Closed)));
    }
}
