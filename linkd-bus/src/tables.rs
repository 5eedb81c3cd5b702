//! Bookkeeping shared by bus implementations

use std::collections::{HashMap, HashSet};

use crate::bus::WatchId;
use crate::error::{BusError, Result};
use crate::path::{BusName, ObjectPath};

/// Set of `(path, interface)` registrations
#[derive(Debug, Default)]
pub struct ObjectTable {
    objects: HashSet<(ObjectPath, String)>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: &ObjectPath, interface: &str) -> Result<()> {
        if !self.objects.insert((path.clone(), interface.to_string())) {
            return Err(BusError::ObjectExists {
                path: path.to_string(),
                interface: interface.to_string(),
            });
        }
        Ok(())
    }

    pub fn unregister(&mut self, path: &ObjectPath, interface: &str) -> bool {
        self.objects.remove(&(path.clone(), interface.to_string()))
    }

    pub fn contains(&self, path: &ObjectPath, interface: &str) -> bool {
        self.objects.contains(&(path.clone(), interface.to_string()))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Disconnect watches keyed by id
#[derive(Debug, Default)]
pub struct WatchTable {
    next_id: u64,
    watches: HashMap<WatchId, BusName>,
}

impl WatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str) -> WatchId {
        self.next_id += 1;
        let id = WatchId(self.next_id);
        self.watches.insert(id, name.to_string());
        id
    }

    pub fn remove(&mut self, id: WatchId) -> bool {
        self.watches.remove(&id).is_some()
    }

    /// Watches registered on `name`, in registration order
    ///
    /// The watches stay registered; whoever owns them cancels them.
    pub fn watching(&self, name: &str) -> Vec<WatchId> {
        let mut ids: Vec<_> = self
            .watches
            .iter()
            .filter(|(_, watched)| watched.as_str() == name)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_registration_is_rejected() {
        let mut table = ObjectTable::new();
        let path = ObjectPath::new("/sessions/a").unwrap();
        table.register(&path, "net.linkd.Session").unwrap();

        let err = table.register(&path, "net.linkd.Session").unwrap_err();
        assert!(matches!(err, BusError::ObjectExists { .. }));

        // A different interface at the same path is fine
        table.register(&path, "net.linkd.Other").unwrap();
        assert!(table.contains(&path, "net.linkd.Other"));
    }

    #[test]
    fn unregister_reports_whether_present() {
        let mut table = ObjectTable::new();
        let path = ObjectPath::new("/x").unwrap();
        table.register(&path, "i").unwrap();
        assert!(table.unregister(&path, "i"));
        assert!(!table.unregister(&path, "i"));
        assert!(table.is_empty());
    }

    #[test]
    fn watch_ids_are_unique_and_grouped_by_name() {
        let mut table = WatchTable::new();
        let a1 = table.add(":1.1");
        let b = table.add(":1.2");
        let a2 = table.add(":1.1");

        assert_ne!(a1, a2);
        assert_eq!(table.watching(":1.1"), vec![a1, a2]);
        assert_eq!(table.watching(":1.2"), vec![b]);
    }

    #[test]
    fn removing_a_watch_twice_is_harmless() {
        let mut table = WatchTable::new();
        let id = table.add(":1.1");
        assert!(table.remove(id));
        assert!(!table.remove(id));
        assert!(table.watching(":1.1").is_empty());
    }
}
