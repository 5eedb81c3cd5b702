//! Session entity

use linkd_bus::{BusName, ObjectPath, WatchId};

use super::attributes::SessionSettings;
use super::liveness::LivenessWatch;

/// One client's connectivity policy and where to push its notifications
///
/// The owner never changes after creation. Settings change only through the
/// registry, one attribute at a time.
#[derive(Debug)]
pub struct Session {
    /// Registry key and object path of the session
    path: ObjectPath,
    /// Bus name of the peer that created the session
    owner: BusName,
    /// Object on the owner that receives `Update` and `Release`
    notify_path: ObjectPath,
    /// Fires when the owner leaves the bus
    watch: LivenessWatch,
    settings: SessionSettings,
}

impl Session {
    pub(crate) fn new(
        path: ObjectPath,
        owner: BusName,
        notify_path: ObjectPath,
        watch: LivenessWatch,
        settings: SessionSettings,
    ) -> Self {
        Self {
            path,
            owner,
            notify_path,
            watch,
            settings,
        }
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn notify_path(&self) -> &ObjectPath {
        &self.notify_path
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub(crate) fn settings_mut(&mut self) -> &mut SessionSettings {
        &mut self.settings
    }

    /// Id of the owner liveness watch, while it is active
    pub fn watch_id(&self) -> Option<WatchId> {
        self.watch.is_active().then(|| self.watch.id())
    }

    pub fn is_owned_by(&self, name: &str) -> bool {
        self.owner == name
    }

    /// Cancel the owner liveness watch; later calls do nothing
    pub(crate) fn release_watch(&mut self) -> bool {
        self.watch.release()
    }
}
