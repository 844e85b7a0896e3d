//! Transport collaborator: the connection the detector rides on.

use std::sync::Arc;

use crate::errors::ChannelError;
use crate::ids::ListenerId;
use crate::room::PresenceRoom;

/// Registration state reported by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Connection attempt in progress.
    Registering,
    /// Connected and authenticated.
    Registered,
    /// Connection attempt failed.
    ConnectionFailed,
    /// Disconnected.
    Unregistered,
}

impl ConnectionState {
    /// Whether rooms can be created in this state.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Registered)
    }

    /// Whether this state ends any previously established connection.
    pub fn is_disconnect(self) -> bool {
        matches!(self, Self::Unregistered | Self::ConnectionFailed)
    }
}

/// Callback invoked on every connection state change. May run on any thread.
pub type StateListener = Arc<dyn Fn(ConnectionState) + Send + Sync>;

/// The connection layer the detector depends on.
///
/// Implementations may invoke listeners synchronously from inside any of
/// these methods, so callers must not hold locks that a listener would take.
pub trait Transport: Send + Sync {
    /// Whether the transport is currently connected.
    fn is_connected(&self) -> bool;

    /// Register for connection state changes.
    fn add_state_listener(&self, listener: StateListener) -> ListenerId;

    /// Unregister a listener. Unknown ids are ignored.
    fn remove_state_listener(&self, id: ListenerId);

    /// Obtain a handle to the named shared presence room. Does not join it.
    fn create_room(&self, name: &str) -> Result<Arc<dyn PresenceRoom>, ChannelError>;
}
