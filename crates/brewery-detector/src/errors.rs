//! Detector error types.
//!
//! None of these escape the detector's public operations: they are built at
//! the point of failure and logged with their [`DetectorError::category`].

use brewery_core::{ChannelError, PublishError, WorkerId};

#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// The configured room name is empty.
    #[error("invalid room name: {0:?}")]
    InvalidRoomName(String),

    /// Room creation or join rejected by the transport.
    #[error("failed to join room {room}: {source}")]
    ChannelJoinFailed {
        room: String,
        #[source]
        source: ChannelError,
    },

    /// The event bus could not take an event; the event is dropped.
    #[error("event bus unavailable, dropped {event_type} for {worker}: {source}")]
    EventBusUnavailable {
        worker: WorkerId,
        event_type: &'static str,
        #[source]
        source: PublishError,
    },

    /// A worker announced a status value outside IDLE/BUSY/UNDEFINED.
    #[error("unrecognized status {value:?} from {worker}")]
    UnrecognizedStatus { worker: WorkerId, value: String },
}

impl DetectorError {
    /// Error category string for the `error_kind` log field.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRoomName(_) => "invalid_room_name",
            Self::ChannelJoinFailed { .. } => "channel_join_failed",
            Self::EventBusUnavailable { .. } => "event_bus_unavailable",
            Self::UnrecognizedStatus { .. } => "unrecognized_status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_failure_display_includes_cause() {
        let err = DetectorError::ChannelJoinFailed {
            room: "brewery@muc".into(),
            source: ChannelError::JoinRejected("not-allowed".into()),
        };
        assert_eq!(
            err.to_string(),
            "failed to join room brewery@muc: join rejected: not-allowed"
        );
        assert_eq!(err.category(), "channel_join_failed");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn bus_failure_display() {
        let err = DetectorError::EventBusUnavailable {
            worker: WorkerId::from_raw("room@host/a"),
            event_type: "went_offline",
            source: PublishError::NoSubscribers,
        };
        assert!(err.to_string().contains("dropped went_offline for room@host/a"));
        assert_eq!(err.category(), "event_bus_unavailable");
    }

    #[test]
    fn categories() {
        assert_eq!(
            DetectorError::InvalidRoomName(String::new()).category(),
            "invalid_room_name"
        );
        assert_eq!(
            DetectorError::UnrecognizedStatus {
                worker: WorkerId::from_raw("a"),
                value: "paused".into()
            }
            .category(),
            "unrecognized_status"
        );
    }
}
