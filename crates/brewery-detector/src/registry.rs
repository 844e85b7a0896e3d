//! Registry of known workers.
//!
//! Copy-on-write: the worker list lives behind an `Arc` that writers replace
//! (or mutate in place when no snapshot is outstanding) under a short write
//! lock. Readers clone the `Arc` and iterate an immutable view, so a snapshot
//! is always a complete state that existed at or after the call and never
//! observes a half-applied change.

use std::sync::Arc;

use brewery_core::{WorkerId, WorkerStatus};
use parking_lot::RwLock;

/// A worker as currently known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Worker {
    /// Room address, e.g. `"room@muc.host/nick"`.
    pub id: WorkerId,
    pub status: WorkerStatus,
}

impl Worker {
    pub fn new(id: WorkerId, status: WorkerStatus) -> Self {
        Self { id, status }
    }

    pub fn is_idle(&self) -> bool {
        self.status == WorkerStatus::Idle
    }
}

/// What [`MemberRegistry::upsert`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated { previous: WorkerStatus },
}

/// Ordered map of worker id to status. Insertion order is preserved and is
/// the order selection scans in.
#[derive(Default)]
pub struct MemberRegistry {
    workers: RwLock<Arc<Vec<Worker>>>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new worker at the end, or overwrite the status of an existing
    /// one in place (keeping its position).
    pub fn upsert(&self, id: &WorkerId, status: WorkerStatus) -> Upsert {
        debug_assert!(!status.is_undefined(), "undefined status is never stored");

        let mut guard = self.workers.write();
        let workers = Arc::make_mut(&mut guard);
        if let Some(worker) = workers.iter_mut().find(|w| &w.id == id) {
            let previous = std::mem::replace(&mut worker.status, status);
            Upsert::Updated { previous }
        } else {
            workers.push(Worker::new(id.clone(), status));
            Upsert::Created
        }
    }

    /// Remove a worker. Returns whether it was present.
    pub fn remove(&self, id: &WorkerId) -> bool {
        let mut guard = self.workers.write();
        let Some(pos) = guard.iter().position(|w| &w.id == id) else {
            return false;
        };
        let _ = Arc::make_mut(&mut guard).remove(pos);
        true
    }

    pub fn find(&self, id: &WorkerId) -> Option<Worker> {
        self.snapshot().iter().find(|w| &w.id == id).cloned()
    }

    pub fn contains(&self, id: &WorkerId) -> bool {
        self.workers.read().iter().any(|w| &w.id == id)
    }

    /// Point-in-time view in insertion order.
    pub fn snapshot(&self) -> Arc<Vec<Worker>> {
        Arc::clone(&self.workers.read())
    }

    /// Remove every worker at once, returning them in insertion order.
    pub fn drain(&self) -> Vec<Worker> {
        let taken = std::mem::take(&mut *self.workers.write());
        Arc::try_unwrap(taken).unwrap_or_else(|shared| (*shared).clone())
    }

    pub fn len(&self) -> usize {
        self.workers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.read().is_empty()
    }
}
