use brewery_core::{EventBus, PublishError, WorkerEvent};
use brewery_settings::DetectorSettings;
use tokio::sync::broadcast;

/// [`EventBus`] backed by a `tokio` broadcast channel.
///
/// Every subscriber sees every event published after it subscribed. With no
/// subscribers the bus counts as unavailable and the event is lost. Slow
/// subscribers lag and miss the oldest events once `capacity` is exceeded.
pub struct BroadcastBus {
    tx: broadcast::Sender<WorkerEvent>,
}

impl BroadcastBus {
    /// A `capacity` of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Bus sized by `eventCapacity`.
    pub fn from_settings(settings: &DetectorSettings) -> Self {
        Self::new(settings.event_capacity)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl EventBus for BroadcastBus {
    fn publish(&self, event: WorkerEvent) -> Result<(), PublishError> {
        self.tx
            .send(event)
            .map(|_| ())
            .map_err(|_| PublishError::NoSubscribers)
    }
}
