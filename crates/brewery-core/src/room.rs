//! Presence room collaborator: the shared room workers gather in.

use std::sync::Arc;

use crate::errors::ChannelError;
use crate::ids::{ListenerId, WorkerId};
use crate::presence::PresencePayload;

/// Kind of member notification delivered by a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberEventKind {
    Joined,
    Left,
    Kicked,
    Quit,
    PropertyChanged,
}

impl MemberEventKind {
    /// Whether the member is gone from the room after this notification.
    pub fn is_departure(self) -> bool {
        matches!(self, Self::Left | Self::Kicked | Self::Quit)
    }
}

/// A member of the room as seen in a notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomMember {
    pub address: WorkerId,
    /// Latest presence, if the room has received any from this member.
    pub presence: Option<PresencePayload>,
}

impl RoomMember {
    pub fn new(address: WorkerId, presence: Option<PresencePayload>) -> Self {
        Self { address, presence }
    }
}

/// Notification about a room member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberEvent {
    pub kind: MemberEventKind,
    pub member: RoomMember,
}

impl MemberEvent {
    pub fn new(kind: MemberEventKind, member: RoomMember) -> Self {
        Self { kind, member }
    }
}

/// Callback invoked for every member notification. May run on any thread,
/// including synchronously inside [`PresenceRoom::join`] or
/// [`PresenceRoom::leave`].
pub type MemberListener = Arc<dyn Fn(&MemberEvent) + Send + Sync>;

/// A shared presence room.
pub trait PresenceRoom: Send + Sync {
    /// Room name (bare address).
    fn name(&self) -> &str;

    /// Join the room. Blocks until the join completes or is rejected.
    fn join(&self) -> Result<(), ChannelError>;

    /// Leave the room. Leaving a room that was never joined is a no-op.
    fn leave(&self);

    /// Register for member joined/left/kicked/quit/property-changed notifications.
    fn add_member_listener(&self, listener: MemberListener) -> ListenerId;

    /// Unregister a listener. Unknown ids are ignored.
    fn remove_member_listener(&self, id: ListenerId);
}
