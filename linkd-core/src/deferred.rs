//! Work that runs after the current dispatch cycle
//!
//! A create call must be answered before the owner sees its first `Update`.
//! Instead of sending the snapshot inline, the registry queues a task here and
//! the dispatcher drains the queue once the reply has gone out.

use std::collections::VecDeque;

use linkd_bus::ObjectPath;

/// A unit of post-dispatch work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredTask {
    /// Push the full state of the session at this path to its owner
    NotifyAll(ObjectPath),
}

/// FIFO of [`DeferredTask`]s
#[derive(Debug, Default)]
pub struct DeferredQueue {
    tasks: VecDeque<DeferredTask>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: DeferredTask) {
        self.tasks.push_back(task);
    }

    pub fn pop(&mut self) -> Option<DeferredTask> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop every pending task for `path`
    pub fn forget(&mut self, path: &ObjectPath) {
        self.tasks.retain(|task| match task {
            DeferredTask::NotifyAll(p) => p != path,
        });
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
