//! Collaborator error types.

/// Failures reported by the transport or the presence room.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The transport refused to create the room.
    #[error("room creation rejected: {0}")]
    CreateRejected(String),

    /// The room refused the join.
    #[error("join rejected: {0}")]
    JoinRejected(String),

    /// The transport does not offer multi-user rooms.
    #[error("presence rooms not supported by transport")]
    NotSupported,

    /// The transport is not connected.
    #[error("transport not connected")]
    NotConnected,
}

impl ChannelError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::CreateRejected(_) => "create_rejected",
            Self::JoinRejected(_) => "join_rejected",
            Self::NotSupported => "not_supported",
            Self::NotConnected => "not_connected",
        }
    }
}

/// Failures publishing on the event bus. The event is lost in every case.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// Nobody is listening on the bus.
    #[error("event bus has no subscribers")]
    NoSubscribers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_error_display() {
        let err = ChannelError::JoinRejected("forbidden".into());
        assert_eq!(err.to_string(), "join rejected: forbidden");
        assert_eq!(err.error_kind(), "join_rejected");
    }

    #[test]
    fn channel_error_kinds() {
        assert_eq!(ChannelError::CreateRejected(String::new()).error_kind(), "create_rejected");
        assert_eq!(ChannelError::NotSupported.error_kind(), "not_supported");
        assert_eq!(ChannelError::NotConnected.error_kind(), "not_connected");
    }

    #[test]
    fn publish_error_display() {
        assert_eq!(PublishError::NoSubscribers.to_string(), "event bus has no subscribers");
    }
}
