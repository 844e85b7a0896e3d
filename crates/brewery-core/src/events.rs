use serde::{Deserialize, Serialize};

use crate::ids::WorkerId;

/// Lifecycle events published by the detector on the event bus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerEvent {
    /// A worker reported IDLE (`available: true`) or BUSY (`available: false`).
    #[serde(rename = "availability_changed")]
    AvailabilityChanged { worker: WorkerId, available: bool },

    /// A worker left the room, or the room was left.
    #[serde(rename = "went_offline")]
    WentOffline { worker: WorkerId },
}

impl WorkerEvent {
    pub fn availability(worker: WorkerId, available: bool) -> Self {
        Self::AvailabilityChanged { worker, available }
    }

    pub fn offline(worker: WorkerId) -> Self {
        Self::WentOffline { worker }
    }

    pub fn worker(&self) -> &WorkerId {
        match self {
            Self::AvailabilityChanged { worker, .. } | Self::WentOffline { worker } => worker,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AvailabilityChanged { .. } => "availability_changed",
            Self::WentOffline { .. } => "went_offline",
        }
    }

    /// Event-bus topic for subscribers that route by path.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::AvailabilityChanged { .. } => "brewery/worker/STATUS",
            Self::WentOffline { .. } => "brewery/worker/OFFLINE",
        }
    }
}
