//! The dispatcher task
//!
//! Exactly one task owns the [`SessionContext`]. Connection tasks forward
//! decoded calls and fired watches over a channel; the dispatcher handles
//! them one at a time, so session state never needs a lock.

use linkd_bus::{MethodCall, WatchId};
use linkd_core::SessionContext;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Capacity of the inbound event channel
pub const INBOUND_CAPACITY: usize = 256;

/// Events handled by the dispatcher
#[derive(Debug)]
pub enum Inbound {
    /// A method call, with its sender already filled in
    Call(MethodCall),
    /// A peer left the bus and this watch on it fired
    WatchFired(WatchId),
}

pub struct Dispatcher {
    ctx: SessionContext,
    inbound: mpsc::Receiver<Inbound>,
    shutdown: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        ctx: SessionContext,
        inbound: mpsc::Receiver<Inbound>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            ctx,
            inbound,
            shutdown,
        }
    }

    /// Handle events until shutdown or until every sender is gone, then tear
    /// down all sessions. Returns the context for inspection.
    pub async fn run(mut self) -> SessionContext {
        info!("dispatcher started");
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!("dispatcher cancelled");
                    break;
                }
                event = self.inbound.recv() => match event {
                    Some(event) => self.handle(event),
                    None => {
                        debug!("inbound channel closed");
                        break;
                    }
                },
            }
        }

        self.ctx.shutdown();
        info!("dispatcher stopped");
        self.ctx
    }

    fn handle(&mut self, event: Inbound) {
        match event {
            Inbound::Call(call) => {
                debug!(
                    sender = %call.sender,
                    serial = call.serial,
                    path = %call.path,
                    member = %call.member,
                    "dispatching call"
                );
                self.ctx.dispatch(call);
            }
            Inbound::WatchFired(id) => {
                let result = self.ctx.watch_fired(id);
                if result.is_empty() {
                    debug!(watch = %id, "watch fired with nothing to clean up");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use linkd_bus::{Dict, MemoryBus, Message, ObjectPath, Value, interfaces};
    use linkd_core::MockConnectivity;

    fn create_call(sender: &str, notify: &str) -> MethodCall {
        MethodCall::new(ObjectPath::root(), interfaces::MANAGER, "CreateSession")
            .with_sender(sender)
            .with_args(vec![Value::Dict(Dict::new()), Value::from(notify)])
    }

    fn spawn() -> (
        mpsc::Sender<Inbound>,
        CancellationToken,
        Arc<MemoryBus>,
        tokio::task::JoinHandle<SessionContext>,
    ) {
        let bus = Arc::new(MemoryBus::new());
        let ctx = SessionContext::new(bus.clone(), Arc::new(MockConnectivity::new()));
        let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
        let token = CancellationToken::new();
        let handle = tokio::spawn(Dispatcher::new(ctx, rx, token.clone()).run());
        (tx, token, bus, handle)
    }

    #[tokio::test]
    async fn handles_events_in_order() {
        let (tx, _token, bus, handle) = spawn();
        tx.send(Inbound::Call(create_call(":1.1", "/a"))).await.unwrap();
        tx.send(Inbound::Call(create_call(":1.2", "/a"))).await.unwrap();
        drop(tx);

        let ctx = handle.await.unwrap();
        assert!(ctx.registry().is_empty());

        let sent = bus.sent();
        assert!(matches!(sent[0], Message::Reply { .. }));
        assert_eq!(sent[1].member(), Some("Update"));
        assert!(matches!(sent[2], Message::Error { .. }));
        assert_eq!(sent[3].member(), Some("Release"));
    }

    #[tokio::test]
    async fn watch_fired_removes_sessions() {
        let (tx, _token, bus, handle) = spawn();
        tx.send(Inbound::Call(create_call(":1.1", "/a"))).await.unwrap();
        // let the call land before the peer goes away
        while bus.watch_count() == 0 {
            tokio::task::yield_now().await;
        }
        for id in bus.disconnect_peer(":1.1") {
            tx.send(Inbound::WatchFired(id)).await.unwrap();
        }
        drop(tx);

        let ctx = handle.await.unwrap();
        assert!(ctx.registry().is_empty());
        assert_eq!(bus.watch_count(), 0);
        assert!(bus.sent_to(":1.1").iter().all(|m| m.member() != Some("Release")));
    }

    #[tokio::test]
    async fn cancellation_stops_dispatcher() {
        let (_tx, token, _bus, handle) = spawn();
        token.cancel();
        let ctx = handle.await.unwrap();
        assert!(ctx.registry().is_empty());
    }
}
