//! Notifications pushed to session owners
//!
//! Two payload shapes go out as `Update`:
//! - the full snapshot, once after create
//! - a single-entry dictionary after each recognized change
//!
//! `Release` tells an owner that the daemon dropped its session during bulk
//! teardown. All of these are one-way: a send failure is logged and
//! forgotten, never reported to the call that triggered it.

use std::sync::Arc;

use linkd_bus::{Bus, Dict, Message, Value, interfaces};
use tracing::{debug, warn};

use crate::connectivity::{ConnectivityManager, ServiceView};
use crate::session::{Session, keys};

/// Member names on the owner's notification interface
pub mod members {
    pub const UPDATE: &str = "Update";
    pub const RELEASE: &str = "Release";
}

/// Snapshot keys filled from the connectivity manager
pub mod service_keys {
    pub const BEARER: &str = "Bearer";
    pub const ONLINE: &str = "Online";
    pub const NAME: &str = "Name";
    pub const IPV4: &str = "IPv4";
    pub const IPV6: &str = "IPv6";
    pub const INTERFACE: &str = "Interface";
    pub const SESSION_MARKER: &str = "SessionMarker";
}

/// Builds and sends owner notifications
pub struct NotificationDispatcher {
    bus: Arc<dyn Bus>,
    connectivity: Arc<dyn ConnectivityManager>,
}

impl NotificationDispatcher {
    pub fn new(bus: Arc<dyn Bus>, connectivity: Arc<dyn ConnectivityManager>) -> Self {
        Self { bus, connectivity }
    }

    /// Every attribute of `session` plus the connectivity manager's view
    pub fn snapshot(&self, session: &Session) -> Dict {
        let view = self.connectivity.service_view(session).unwrap_or_default();
        let ServiceView {
            bearer,
            online,
            name,
            interface,
            ipv4,
            ipv6,
        } = view;
        let settings = session.settings();

        Dict::new()
            .with(service_keys::BEARER, bearer)
            .with(service_keys::ONLINE, online)
            .with(service_keys::NAME, name)
            .with(service_keys::IPV4, ipv4)
            .with(service_keys::IPV6, ipv6)
            .with(service_keys::INTERFACE, interface)
            .with(keys::REALTIME, settings.realtime)
            .with(keys::ALLOWED_BEARERS, settings.allowed_bearer_names())
            .with(keys::AVOID_HANDOVER, settings.avoid_handover)
            .with(keys::STAY_CONNECTED, settings.stay_connected)
            .with(keys::PERIODIC_CONNECT, settings.periodic_connect)
            .with(keys::IDLE_TIMEOUT, settings.idle_timeout)
            .with(keys::EMERGENCY_CALL, settings.emergency_call)
            .with(keys::ROAMING_ALLOWED, settings.roaming_allowed)
            .with(service_keys::SESSION_MARKER, 0u32)
    }

    /// Push the full snapshot
    pub fn notify_all(&self, session: &Session) {
        debug!(path = %session.path(), owner = session.owner(), "sending full update");
        let snapshot = self.snapshot(session);
        self.deliver(session, members::UPDATE, vec![Value::Dict(snapshot)]);
    }

    /// Push one changed attribute
    pub fn notify_changed(&self, session: &Session, key: &str, value: Value) {
        debug!(path = %session.path(), key, "sending partial update");
        let update = Dict::new().with(key, value);
        self.deliver(session, members::UPDATE, vec![Value::Dict(update)]);
    }

    /// Tell the owner its session is gone
    pub fn release(&self, session: &Session) {
        debug!(path = %session.path(), owner = session.owner(), "sending release");
        self.deliver(session, members::RELEASE, Vec::new());
    }

    fn deliver(&self, session: &Session, member: &str, args: Vec<Value>) {
        let message = Message::notify(
            session.owner(),
            session.notify_path().clone(),
            interfaces::NOTIFICATION,
            member,
            args,
        );
        if let Err(e) = self.bus.send(message) {
            warn!(
                path = %session.path(),
                owner = session.owner(),
                member,
                error = %e,
                "notification not delivered"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::MockConnectivity;
    use crate::session::{LivenessMonitor, SessionSettings};
    use linkd_bus::{MemoryBus, ObjectPath};

    fn session(bus: &Arc<MemoryBus>) -> Session {
        let monitor = LivenessMonitor::new(bus.clone());
        Session::new(
            ObjectPath::new("/sessions/app").unwrap(),
            ":1.4".to_string(),
            ObjectPath::new("/app").unwrap(),
            monitor.watch(":1.4").unwrap(),
            SessionSettings::default(),
        )
    }

    #[test]
    fn snapshot_keys_are_ordered() {
        let bus = Arc::new(MemoryBus::new());
        let dispatcher = NotificationDispatcher::new(bus.clone(), Arc::new(MockConnectivity::new()));
        let snapshot = dispatcher.snapshot(&session(&bus));

        let keys: Vec<_> = snapshot.keys().collect();
        assert_eq!(
            keys,
            vec![
                "Bearer",
                "Online",
                "Name",
                "IPv4",
                "IPv6",
                "Interface",
                "Realtime",
                "AllowedBearers",
                "AvoidHandover",
                "StayConnected",
                "PeriodicConnect",
                "IdleTimeout",
                "EmergencyCall",
                "RoamingAllowed",
                "SessionMarker",
            ]
        );
        assert_eq!(snapshot.get("SessionMarker"), Some(&Value::U32(0)));
        assert_eq!(snapshot.get("Online"), Some(&Value::Bool(false)));
    }

    #[test]
    fn snapshot_uses_service_view() {
        let bus = Arc::new(MemoryBus::new());
        let connectivity = Arc::new(MockConnectivity::new());
        connectivity.set_view(ServiceView {
            bearer: "wifi".into(),
            online: true,
            name: "home".into(),
            interface: "wlan0".into(),
            ipv4: Dict::new().with("Address", "192.0.2.10"),
            ipv6: Dict::new(),
        });
        let dispatcher = NotificationDispatcher::new(bus.clone(), connectivity);
        let snapshot = dispatcher.snapshot(&session(&bus));

        assert_eq!(snapshot.get("Bearer"), Some(&Value::from("wifi")));
        assert_eq!(snapshot.get("Online"), Some(&Value::Bool(true)));
        assert_eq!(snapshot.get("Interface"), Some(&Value::from("wlan0")));
        let ipv4 = snapshot.get("IPv4").and_then(Value::as_dict).unwrap();
        assert_eq!(ipv4.get("Address"), Some(&Value::from("192.0.2.10")));
    }

    #[test]
    fn notifications_go_to_owner_notify_path() {
        let bus = Arc::new(MemoryBus::new());
        let dispatcher = NotificationDispatcher::new(bus.clone(), Arc::new(MockConnectivity::new()));
        let session = session(&bus);

        dispatcher.notify_changed(&session, keys::IDLE_TIMEOUT, Value::U32(30));
        dispatcher.release(&session);

        let sent = bus.sent();
        assert_eq!(sent.len(), 2);
        match &sent[0] {
            Message::Notify {
                destination,
                path,
                interface,
                member,
                args,
            } => {
                assert_eq!(destination, ":1.4");
                assert_eq!(path.as_str(), "/app");
                assert_eq!(interface, interfaces::NOTIFICATION);
                assert_eq!(member, members::UPDATE);
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(sent[1].member(), Some(members::RELEASE));
    }

    #[test]
    fn failed_delivery_is_swallowed() {
        let bus = Arc::new(MemoryBus::new());
        let dispatcher = NotificationDispatcher::new(bus.clone(), Arc::new(MockConnectivity::new()));
        let session = session(&bus);
        bus.set_unreachable(":1.4");

        dispatcher.notify_all(&session);
        assert!(bus.sent().is_empty());
    }
}
