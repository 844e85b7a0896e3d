//! In-process transport and room.
//!
//! [`LocalTransport`] and [`LocalRoom`] implement the collaborator traits
//! without any network: connection state is driven by hand and member
//! notifications are delivered synchronously on the calling thread, the same
//! way a real transport may deliver them from inside `join`/`leave`. Useful
//! for tests and for running the detector in a single process.
//!
//! Neither type holds its own lock while invoking listeners, so listeners may
//! call back into them.

use std::collections::HashMap;
use std::sync::Arc;

use brewery_core::{
    ChannelError, ConnectionState, ListenerId, MemberEvent, MemberEventKind, MemberListener,
    PresencePayload, PresenceRoom, RoomMember, StateListener, Transport, WorkerId,
};
use parking_lot::Mutex;

#[derive(Default)]
struct TransportState {
    connected: bool,
    listeners: Vec<(ListenerId, StateListener)>,
    rooms: HashMap<String, Arc<LocalRoom>>,
    fail_next_create: Option<ChannelError>,
    create_calls: usize,
}

/// Hand-driven [`Transport`].
#[derive(Default)]
pub struct LocalTransport {
    state: Mutex<TransportState>,
}

impl LocalTransport {
    /// A disconnected transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that already reports connected.
    pub fn connected() -> Self {
        let transport = Self::new();
        transport.state.lock().connected = true;
        transport
    }

    /// Change the connection state and notify listeners.
    pub fn set_state(&self, state: ConnectionState) {
        let listeners: Vec<StateListener> = {
            let mut inner = self.state.lock();
            inner.connected = state.is_connected();
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(state);
        }
    }

    pub fn connect(&self) {
        self.set_state(ConnectionState::Registered);
    }

    pub fn disconnect(&self) {
        self.set_state(ConnectionState::Unregistered);
    }

    /// Make the next `create_room` call fail with `err`.
    pub fn fail_next_create(&self, err: ChannelError) {
        self.state.lock().fail_next_create = Some(err);
    }

    /// Room previously handed out under `name`.
    pub fn room(&self, name: &str) -> Option<Arc<LocalRoom>> {
        self.state.lock().rooms.get(name).cloned()
    }

    /// Room under `name`, created if it does not exist yet. Lets a test
    /// populate the room before anyone joins it.
    pub fn room_or_create(&self, name: &str) -> Arc<LocalRoom> {
        let mut inner = self.state.lock();
        Arc::clone(
            inner
                .rooms
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(LocalRoom::new(name))),
        )
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Number of `create_room` calls, failed ones included.
    pub fn create_calls(&self) -> usize {
        self.state.lock().create_calls
    }
}

impl Transport for LocalTransport {
    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn add_state_listener(&self, listener: StateListener) -> ListenerId {
        let id = ListenerId::next();
        self.state.lock().listeners.push((id, listener));
        id
    }

    fn remove_state_listener(&self, id: ListenerId) {
        self.state.lock().listeners.retain(|(lid, _)| *lid != id);
    }

    fn create_room(&self, name: &str) -> Result<Arc<dyn PresenceRoom>, ChannelError> {
        {
            let mut inner = self.state.lock();
            inner.create_calls += 1;
            if let Some(err) = inner.fail_next_create.take() {
                return Err(err);
            }
            if !inner.connected {
                return Err(ChannelError::NotConnected);
            }
        }
        let room: Arc<dyn PresenceRoom> = self.room_or_create(name);
        Ok(room)
    }
}

#[derive(Default)]
struct RoomState {
    joined: bool,
    listeners: Vec<(ListenerId, MemberListener)>,
    members: Vec<RoomMember>,
    fail_next_join: Option<ChannelError>,
    join_count: usize,
    leave_count: usize,
}

/// Hand-driven [`PresenceRoom`].
///
/// Tracks occupants whether or not the room is joined, but delivers member
/// notifications only while joined. Joining replays a `Joined` notification
/// for every current occupant before `join` returns.
pub struct LocalRoom {
    name: String,
    state: Mutex<RoomState>,
}

impl LocalRoom {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(RoomState::default()),
        }
    }

    /// A member enters the room with `presence`.
    pub fn member_joined(&self, address: &WorkerId, presence: Option<PresencePayload>) {
        let member = RoomMember::new(address.clone(), presence);
        {
            let mut state = self.state.lock();
            state.members.retain(|m| &m.address != address);
            state.members.push(member.clone());
        }
        self.deliver(&MemberEvent::new(MemberEventKind::Joined, member));
    }

    /// An occupant publishes new presence.
    pub fn update_presence(&self, address: &WorkerId, presence: PresencePayload) {
        let member = RoomMember::new(address.clone(), Some(presence));
        {
            let mut state = self.state.lock();
            match state.members.iter_mut().find(|m| &m.address == address) {
                Some(existing) => *existing = member.clone(),
                None => state.members.push(member.clone()),
            }
        }
        self.deliver(&MemberEvent::new(MemberEventKind::PropertyChanged, member));
    }

    /// An occupant leaves, is kicked, or quits.
    pub fn member_departed(&self, address: &WorkerId, kind: MemberEventKind) {
        debug_assert!(kind.is_departure());
        let member = {
            let mut state = self.state.lock();
            let pos = state.members.iter().position(|m| &m.address == address);
            pos.map(|p| state.members.remove(p))
                .unwrap_or_else(|| RoomMember::new(address.clone(), None))
        };
        self.deliver(&MemberEvent::new(kind, member));
    }

    /// Deliver an arbitrary notification to listeners (if joined), leaving
    /// occupants untouched. For duplicate and out-of-order scenarios.
    pub fn deliver(&self, event: &MemberEvent) {
        let listeners: Vec<MemberListener> = {
            let state = self.state.lock();
            if !state.joined {
                return;
            }
            state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(event);
        }
    }

    /// Make the next `join` fail with `err`.
    pub fn fail_next_join(&self, err: ChannelError) {
        self.state.lock().fail_next_join = Some(err);
    }

    pub fn is_joined(&self) -> bool {
        self.state.lock().joined
    }

    /// Successful joins so far.
    pub fn join_count(&self) -> usize {
        self.state.lock().join_count
    }

    pub fn leave_count(&self) -> usize {
        self.state.lock().leave_count
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    pub fn members(&self) -> Vec<RoomMember> {
        self.state.lock().members.clone()
    }
}

impl PresenceRoom for LocalRoom {
    fn name(&self) -> &str {
        &self.name
    }

    fn join(&self) -> Result<(), ChannelError> {
        let occupants = {
            let mut state = self.state.lock();
            if let Some(err) = state.fail_next_join.take() {
                return Err(err);
            }
            if state.joined {
                return Ok(());
            }
            state.joined = true;
            state.join_count += 1;
            state.members.clone()
        };
        for member in occupants {
            self.deliver(&MemberEvent::new(MemberEventKind::Joined, member));
        }
        Ok(())
    }

    fn leave(&self) {
        let mut state = self.state.lock();
        if state.joined {
            state.joined = false;
            state.leave_count += 1;
        }
    }

    fn add_member_listener(&self, listener: MemberListener) -> ListenerId {
        let id = ListenerId::next();
        self.state.lock().listeners.push((id, listener));
        id
    }

    fn remove_member_listener(&self, id: ListenerId) {
        self.state.lock().listeners.retain(|(lid, _)| *lid != id);
    }
}
