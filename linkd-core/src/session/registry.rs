//! SessionRegistry: the map from session path to session
//!
//! The registry enforces the invariants the rest of the daemon relies on:
//! - a session's path is derived from its notify path, so two sessions can
//!   never share a notify target
//! - every registered session has exactly one bus object and one liveness
//!   watch
//! - only the owner may destroy a session, except when the owner has left
//!   the bus or the daemon is shutting down
//!
//! It is not shared: the dispatcher owns it and calls into it one event at a
//! time, so it holds no locks.

use std::collections::HashMap;
use std::sync::Arc;

use linkd_bus::{Bus, BusName, ObjectPath, Value, WatchId, interfaces};
use tracing::{debug, error, info};

use super::attributes::{SessionAttribute, SessionSettings};
use super::liveness::{DisconnectResult, LivenessMonitor};
use super::state::Session;
use crate::connectivity::ConnectivityManager;
use crate::deferred::{DeferredQueue, DeferredTask};
use crate::error::{Result, SessionError};
use crate::notify::NotificationDispatcher;

/// Namespace every session path lives under
pub const SESSION_PREFIX: &str = "/sessions";

/// Derive the session path for a notify path
///
/// `/client/notify` becomes `/sessions/client/notify`.
pub fn session_path_for(notify_path: &ObjectPath) -> Result<ObjectPath> {
    let prefix = ObjectPath::new(SESSION_PREFIX)
        .map_err(|e| SessionError::InvalidArgument(format!("session prefix: {e}")))?;
    Ok(prefix.join(notify_path))
}

/// Owns every live session
pub struct SessionRegistry {
    bus: Arc<dyn Bus>,
    sessions: HashMap<ObjectPath, Session>,
    liveness: LivenessMonitor,
    notifier: NotificationDispatcher,
    deferred: DeferredQueue,
}

impl SessionRegistry {
    pub fn new(bus: Arc<dyn Bus>, connectivity: Arc<dyn ConnectivityManager>) -> Self {
        Self {
            liveness: LivenessMonitor::new(Arc::clone(&bus)),
            notifier: NotificationDispatcher::new(Arc::clone(&bus), connectivity),
            bus,
            sessions: HashMap::new(),
            deferred: DeferredQueue::new(),
        }
    }

    /// Register a new session for `owner`
    ///
    /// The first full `Update` is queued, not sent; it goes out when
    /// [`run_deferred`](Self::run_deferred) is called after the reply.
    pub fn create(
        &mut self,
        owner: &str,
        notify_path: &str,
        settings: SessionSettings,
    ) -> Result<ObjectPath> {
        if notify_path.is_empty() {
            return Err(SessionError::InvalidArgument(
                "missing notify path".to_string(),
            ));
        }
        let notify_path = ObjectPath::new(notify_path)
            .map_err(|e| SessionError::InvalidArgument(e.to_string()))?;

        let path = session_path_for(&notify_path)?;
        if self.sessions.contains_key(&path) {
            return Err(SessionError::AlreadyExists(path));
        }

        if let Err(e) = self.bus.register_object(&path, interfaces::SESSION) {
            error!(path = %path, error = %e, "failed to register session object");
            return Err(SessionError::InvalidArgument(format!(
                "cannot register {path}: {e}"
            )));
        }

        let watch = match self.liveness.watch(owner) {
            Ok(watch) => watch,
            Err(e) => {
                self.bus.unregister_object(&path, interfaces::SESSION);
                return Err(e);
            }
        };

        let session = Session::new(
            path.clone(),
            owner.to_string(),
            notify_path,
            watch,
            settings,
        );
        self.sessions.insert(path.clone(), session);
        self.deferred.push(DeferredTask::NotifyAll(path.clone()));

        info!(path = %path, owner, "session created");
        Ok(path)
    }

    pub fn get(&self, path: &str) -> Option<&Session> {
        let path = ObjectPath::new(path).ok()?;
        self.sessions.get(&path)
    }

    /// Like [`get`](Self::get) but reports a missing session as an error
    pub fn lookup(&self, path: &str) -> Result<&Session> {
        self.get(path)
            .ok_or_else(|| SessionError::NotFound(path.to_string()))
    }

    /// Destroy a session on behalf of `requester`, who must own it
    pub fn destroy(&mut self, path: &str, requester: &str) -> Result<()> {
        let session = self.lookup(path)?;
        if !session.is_owned_by(requester) {
            return Err(SessionError::PermissionDenied {
                path: session.path().clone(),
                requester: requester.to_string(),
            });
        }
        let path = session.path().clone();
        self.teardown(&path);
        Ok(())
    }

    /// Apply a single-attribute change
    ///
    /// Unknown keys and mismatched value shapes are accepted and ignored.
    /// Returns whether anything changed; a change pushes a one-entry `Update`
    /// to the owner.
    pub fn apply_change(&mut self, path: &str, key: &str, value: &Value) -> Result<bool> {
        let object_path = self.lookup(path)?.path().clone();
        let Some(attribute) = SessionAttribute::parse(key, value)? else {
            return Ok(false);
        };

        let Some(session) = self.sessions.get_mut(&object_path) else {
            return Err(SessionError::NotFound(path.to_string()));
        };
        let key = attribute.key();
        session.settings_mut().apply(attribute);
        debug!(path = %object_path, key, "session changed");

        if let Some(current) = session.settings().value_of(key) {
            self.notifier.notify_changed(session, key, current);
        }
        Ok(true)
    }

    /// Tear down every session `owner` created, without notifying it
    pub fn set_owner_disconnected(&mut self, owner: &str) -> Vec<ObjectPath> {
        let mut paths = self.sessions_of(owner);
        paths.sort();
        for path in &paths {
            info!(path = %path, owner, "session owner disconnected");
            self.teardown(path);
        }
        paths
    }

    /// Handle a fired liveness watch
    ///
    /// Watches that no session holds any more (because an earlier event for
    /// the same owner already cleaned up) are ignored.
    pub fn watch_fired(&mut self, id: WatchId) -> DisconnectResult {
        let Some(owner) = self.owner_of_watch(id) else {
            debug!(watch = %id, "ignoring stale watch");
            return DisconnectResult::default();
        };
        let cleanups = self.set_owner_disconnected(&owner);
        DisconnectResult {
            owner: Some(owner),
            cleanups,
        }
    }

    pub fn owner_of_watch(&self, id: WatchId) -> Option<BusName> {
        self.sessions
            .values()
            .find(|s| s.watch_id() == Some(id))
            .map(|s| s.owner().to_string())
    }

    /// Paths of the sessions `owner` created
    pub fn sessions_of(&self, owner: &str) -> Vec<ObjectPath> {
        self.sessions
            .values()
            .filter(|s| s.is_owned_by(owner))
            .map(|s| s.path().clone())
            .collect()
    }

    /// All registered session paths, sorted
    pub fn paths(&self) -> Vec<ObjectPath> {
        let mut paths: Vec<_> = self.sessions.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of post-dispatch tasks waiting
    pub fn pending_tasks(&self) -> usize {
        self.deferred.len()
    }

    /// Run queued post-dispatch work. Returns the number of tasks run.
    pub fn run_deferred(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.deferred.pop() {
            ran += 1;
            match task {
                DeferredTask::NotifyAll(path) => match self.sessions.get(&path) {
                    Some(session) => self.notifier.notify_all(session),
                    None => debug!(path = %path, "session gone before first update"),
                },
            }
        }
        ran
    }

    /// Drop every session, telling each owner with a best-effort `Release`
    pub fn shutdown(&mut self) {
        self.deferred.clear();
        for (path, mut session) in self.sessions.drain() {
            session.release_watch();
            self.bus.unregister_object(&path, interfaces::SESSION);
            self.notifier.release(&session);
            debug!(path = %path, "session released");
        }
    }

    /// Unregister, cancel the watch, then forget the session
    fn teardown(&mut self, path: &ObjectPath) {
        self.bus.unregister_object(path, interfaces::SESSION);
        if let Some(session) = self.sessions.get_mut(path) {
            session.release_watch();
        }
        self.deferred.forget(path);
        if self.sessions.remove(path).is_some() {
            info!(path = %path, "session destroyed");
        }
    }
}
