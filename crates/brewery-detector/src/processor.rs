//! Turns status observations into registry changes and events.

use std::sync::Arc;

use brewery_core::{WorkerId, WorkerStatus};
use tracing::{error, info};

use crate::emitter::EventEmitter;
use crate::errors::DetectorError;
use crate::registry::{MemberRegistry, Upsert};

/// Outcome of a single [`StatusProcessor::observe`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    /// First non-undefined status for an unknown worker.
    Added,
    /// Status overwritten for a known worker.
    Updated,
    /// Undefined status for a known worker.
    Removed,
    /// Undefined status for an unknown worker.
    Ignored,
}

/// The only path that mutates the registry.
///
/// Not synchronized on its own: the detector calls it under its link lock so
/// observations and drains never interleave.
pub struct StatusProcessor {
    registry: Arc<MemberRegistry>,
    emitter: EventEmitter,
}

impl StatusProcessor {
    pub fn new(registry: Arc<MemberRegistry>, emitter: EventEmitter) -> Self {
        Self { registry, emitter }
    }

    pub fn registry(&self) -> &Arc<MemberRegistry> {
        &self.registry
    }

    /// Apply one observed `(worker, status)` pair.
    pub fn observe(&self, worker: &WorkerId, status: WorkerStatus) -> Observation {
        if status.is_undefined() {
            // a repeated departure for an unknown worker is expected and stays silent
            if !self.registry.remove(worker) {
                return Observation::Ignored;
            }
            info!(worker = %worker, "removed worker");
            let _ = self.emitter.offline(worker);
            return Observation::Removed;
        }

        let outcome = match self.registry.upsert(worker, status.clone()) {
            Upsert::Created => {
                info!(worker = %worker, status = %status, "added worker");
                Observation::Added
            }
            Upsert::Updated { .. } => Observation::Updated,
        };

        match status.availability() {
            Some(available) => {
                let _ = self.emitter.availability(worker, available);
            }
            None => {
                let err = DetectorError::UnrecognizedStatus {
                    worker: worker.clone(),
                    value: status.as_str().to_owned(),
                };
                error!(error = %err, error_kind = err.category(), "unknown worker status");
            }
        }

        outcome
    }

    /// Remove every known worker, publishing one `WentOffline` each.
    /// Returns how many were removed.
    pub fn drain(&self) -> usize {
        let drained = self.registry.drain();
        for worker in &drained {
            let _ = self.emitter.offline(&worker.id);
        }
        drained.len()
    }
}
