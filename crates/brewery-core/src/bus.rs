use crate::errors::PublishError;
use crate::events::WorkerEvent;

/// Destination for [`WorkerEvent`]s.
///
/// Publishing must not block and must not call back into the detector.
pub trait EventBus: Send + Sync {
    fn publish(&self, event: WorkerEvent) -> Result<(), PublishError>;
}
