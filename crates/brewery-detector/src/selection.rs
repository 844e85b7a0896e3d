//! First-match worker selection.
//!
//! No tie-break beyond registry order: the earliest-registered idle worker
//! wins.

use crate::registry::Worker;

/// First idle worker in `workers`.
pub fn select_idle(workers: &[Worker]) -> Option<&Worker> {
    workers.iter().find(|w| w.is_idle())
}

/// Whether any worker is known, whatever its status.
pub fn any_connected(workers: &[Worker]) -> bool {
    !workers.is_empty()
}
