//! Per-identity task bookkeeping for the scheduler.
//!
//! At most one task per identity can be registered: inserting goes through
//! [`TaskSlots::replace`], which hands back the task it displaced so the
//! caller can cancel it. Completion goes through [`TaskSlots::complete`],
//! which only succeeds for the current generation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::models::{SourceIdentity, TaskState};

/// A spawned conversion task.
#[derive(Debug)]
pub struct ConversionTask {
    pub id: Uuid,
    pub identity: SourceIdentity,
    pub generation: u64,
    pub cancel: CancellationToken,
    pub handle: Option<JoinHandle<()>>,
}

impl ConversionTask {
    pub fn new(identity: SourceIdentity, generation: u64, cancel: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            generation,
            cancel,
            handle: None,
        }
    }

    #[must_use]
    pub fn with_handle(mut self, handle: JoinHandle<()>) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Signal the task to stop. The task itself notices at its next check.
    pub fn cancel(&self) {
        tracing::debug!(
            task_id = %self.id,
            identity = %self.identity,
            generation = self.generation,
            "cancelling conversion task"
        );
        self.cancel.cancel();
    }
}

/// Running tasks and last known state per identity.
#[derive(Debug, Default)]
pub struct TaskSlots {
    running: HashMap<SourceIdentity, ConversionTask>,
    settled: HashMap<SourceIdentity, TaskState>,
}

impl TaskSlots {
    /// Register `task` as the running task for its identity, returning the
    /// task it displaced.
    pub fn replace(&mut self, task: ConversionTask) -> Option<ConversionTask> {
        self.settled.remove(&task.identity);
        self.running.insert(task.identity.clone(), task)
    }

    /// Remove the running task for `identity`.
    pub fn remove(&mut self, identity: &SourceIdentity) -> Option<ConversionTask> {
        self.running.remove(identity)
    }

    /// Remove and cancel the running task for `identity`, recording the
    /// identity as cancelled. Returns whether a task was in flight.
    pub fn cancel(&mut self, identity: &SourceIdentity) -> bool {
        match self.running.remove(identity) {
            Some(task) => {
                task.cancel();
                self.settled.insert(identity.clone(), TaskState::Cancelled);
                true
            }
            None => false,
        }
    }

    pub fn is_current(&self, identity: &SourceIdentity, generation: u64) -> bool {
        self.running
            .get(identity)
            .is_some_and(|task| task.generation == generation)
    }

    /// Retire the running task for `identity` if it is still `generation`.
    pub fn complete(&mut self, identity: &SourceIdentity, generation: u64) -> bool {
        if !self.is_current(identity, generation) {
            return false;
        }
        self.running.remove(identity);
        self.settled.insert(identity.clone(), TaskState::Completed);
        true
    }

    /// Retire the running task for `identity` without a result, if it is
    /// still `generation`. The identity is recorded as cancelled.
    pub fn abandon(&mut self, identity: &SourceIdentity, generation: u64) -> bool {
        if !self.is_current(identity, generation) {
            return false;
        }
        self.running.remove(identity);
        self.settled.insert(identity.clone(), TaskState::Cancelled);
        true
    }

    /// Record a result served without spawning a task.
    pub fn settle(&mut self, identity: &SourceIdentity, state: TaskState) {
        self.settled.insert(identity.clone(), state);
    }

    pub fn state(&self, identity: &SourceIdentity) -> TaskState {
        if self.running.contains_key(identity) {
            TaskState::Running
        } else {
            self.settled
                .get(identity)
                .copied()
                .unwrap_or(TaskState::Idle)
        }
    }

    /// Drop everything known about `identity`.
    pub fn forget(&mut self, identity: &SourceIdentity) {
        self.settled.remove(identity);
    }

    pub fn in_flight(&self) -> usize {
        self.running.len()
    }

    /// Take every running task, leaving the table empty.
    pub fn drain(&mut self) -> Vec<ConversionTask> {
        self.settled.clear();
        self.running.drain().map(|(_, task)| task).collect()
    }
}

/// Mutex-guarded task slots shared between the scheduler and its workers.
///
/// The guard is never held across an await.
#[derive(Debug, Default)]
pub struct TaskTable {
    slots: Mutex<TaskSlots>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, TaskSlots> {
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
