use std::sync::Arc;

use brewery_core::{EventBus, WorkerEvent, WorkerId};
use tracing::{error, info};

use crate::errors::DetectorError;

/// Publishes worker lifecycle events. Delivery is best effort: when the bus
/// refuses an event it is logged and dropped, never retried.
#[derive(Clone)]
pub struct EventEmitter {
    bus: Arc<dyn EventBus>,
}

impl EventEmitter {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    /// Publish `AvailabilityChanged`. Returns whether the bus took it.
    pub fn availability(&self, worker: &WorkerId, available: bool) -> bool {
        info!(worker = %worker, available, "worker availability changed");
        self.publish(WorkerEvent::availability(worker.clone(), available))
    }

    /// Publish `WentOffline`. Returns whether the bus took it.
    pub fn offline(&self, worker: &WorkerId) -> bool {
        info!(worker = %worker, "worker went offline");
        self.publish(WorkerEvent::offline(worker.clone()))
    }

    fn publish(&self, event: WorkerEvent) -> bool {
        let worker = event.worker().clone();
        let event_type = event.event_type();
        match self.bus.publish(event) {
            Ok(()) => true,
            Err(source) => {
                let err = DetectorError::EventBusUnavailable {
                    worker,
                    event_type,
                    source,
                };
                error!(error = %err, error_kind = err.category(), "dropping worker event");
                false
            }
        }
    }
}
