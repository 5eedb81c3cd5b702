//! SessionContext: everything a dispatch cycle touches
//!
//! The daemon owns one context and feeds it one event at a time: an inbound
//! call, or a liveness watch that fired. Each call goes through
//! [`dispatch`](SessionContext::dispatch), which answers the caller before
//! running any deferred work, so a new session's owner always sees the create
//! reply before its first `Update`.

use std::sync::Arc;

use linkd_bus::{Bus, BusName, MethodCall, ObjectPath, WatchId};
use tracing::{debug, info, warn};

use crate::connectivity::ConnectivityManager;
use crate::error::Result;
use crate::handlers;
use crate::mode::{SessionMode, SessionModeController};
use crate::session::{DisconnectResult, SessionRegistry, SessionSettings};

pub struct SessionContext {
    bus: Arc<dyn Bus>,
    connectivity: Arc<dyn ConnectivityManager>,
    registry: SessionRegistry,
    mode: SessionModeController,
}

impl SessionContext {
    pub fn new(bus: Arc<dyn Bus>, connectivity: Arc<dyn ConnectivityManager>) -> Self {
        Self {
            registry: SessionRegistry::new(Arc::clone(&bus), Arc::clone(&connectivity)),
            mode: SessionModeController::new(Arc::clone(&connectivity)),
            bus,
            connectivity,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SessionRegistry {
        &mut self.registry
    }

    pub fn create_session(
        &mut self,
        owner: &str,
        notify_path: &str,
        settings: SessionSettings,
    ) -> Result<ObjectPath> {
        self.registry.create(owner, notify_path, settings)
    }

    pub fn destroy_session(&mut self, path: &str, requester: &str) -> Result<()> {
        self.registry.destroy(path, requester)
    }

    pub fn get_mode(&self) -> SessionMode {
        self.mode.mode()
    }

    /// Returns whether the mode changed
    pub fn set_mode(&mut self, enabled: bool) -> bool {
        self.mode.set_enabled(enabled)
    }

    /// Ask the connectivity manager to bring the session online
    pub fn connect(&mut self, path: &str) -> Result<()> {
        let session = self.registry.lookup(path)?;
        debug!(path = %session.path(), "connect requested");
        self.connectivity.connect(session)
    }

    pub fn disconnect(&mut self, path: &str) -> Result<()> {
        let session = self.registry.lookup(path)?;
        debug!(path = %session.path(), "disconnect requested");
        self.connectivity.disconnect(session)
    }

    /// A liveness watch fired: drop the owner's sessions
    pub fn watch_fired(&mut self, id: WatchId) -> DisconnectResult {
        let result = self.registry.watch_fired(id);
        if let Some(owner) = &result.owner {
            info!(
                owner = %owner,
                sessions = result.cleanups.len(),
                "owner left the bus"
            );
        }
        result
    }

    pub fn run_deferred(&mut self) -> usize {
        self.registry.run_deferred()
    }

    /// Tear down every session, sending `Release` to each owner
    pub fn shutdown(&mut self) {
        info!(sessions = self.registry.len(), "shutting down session registry");
        self.registry.shutdown();
    }

    /// Run one full dispatch cycle for `call`
    ///
    /// The reply (or error) is sent first, then deferred tasks run.
    pub fn dispatch(&mut self, call: MethodCall) {
        let sender: BusName = call.sender.clone();
        let reply = match handlers::route(self, &call) {
            Ok(args) => call.reply(args),
            Err(e) => {
                debug!(
                    sender = %sender,
                    path = %call.path,
                    member = %call.member,
                    error = %e,
                    "call failed"
                );
                call.error(e.error_name(), e.to_string())
            }
        };

        if let Err(e) = self.bus.send(reply) {
            warn!(sender = %sender, serial = call.serial, error = %e, "failed to send reply");
        }
        self.run_deferred();
    }
}
