//! Worker detector: joins the brewery room while the transport is connected
//! and keeps the registry in step with the room's members.
//!
//! # Locking
//!
//! One mutex (`Inner::link`) serializes every mutation: member notifications,
//! connect/disconnect handling and the drain on leave. It is never held while
//! calling into the transport or the room (`create_room`, `join`, `leave`,
//! listener registration), because those may deliver notifications
//! synchronously on the same thread.
//!
//! Each join attempt gets a new generation number. Member listeners carry the
//! generation they were registered under and their notifications are dropped
//! once the link has moved on, so a late callback from a room that was
//! already left can never repopulate a drained registry.

use std::sync::{Arc, Weak};

use brewery_core::{
    ChannelError, ConnectionState, EventBus, ListenerId, MemberEvent, MemberListener, PresenceRoom,
    StateListener, Transport, WorkerId, WorkerStatus,
};
use brewery_settings::DetectorSettings;
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument};

use crate::emitter::EventEmitter;
use crate::errors::DetectorError;
use crate::presence;
use crate::processor::StatusProcessor;
use crate::registry::{MemberRegistry, Worker};
use crate::selection;

/// Externally visible link state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    /// A join is in flight.
    Joining,
    Joined,
}

struct JoinedRoom {
    room: Arc<dyn PresenceRoom>,
    listener: ListenerId,
}

impl JoinedRoom {
    fn release(self) {
        self.room.remove_member_listener(self.listener);
        self.room.leave();
    }
}

enum Phase {
    Disconnected,
    Joining,
    Joined(JoinedRoom),
}

struct Link {
    phase: Phase,
    generation: u64,
    /// Set by `init` before registering with the transport, cleared by `dispose`.
    subscribed: bool,
    transport_listener: Option<ListenerId>,
}

impl Link {
    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && !matches!(self.phase, Phase::Disconnected)
    }
}

struct Inner {
    room_name: String,
    transport: Arc<dyn Transport>,
    processor: StatusProcessor,
    link: Mutex<Link>,
}

/// Tracks workers gathered in the brewery room and hands out idle ones.
///
/// Call [`init`](Self::init) once after construction and
/// [`dispose`](Self::dispose) on shutdown. Selection methods may be called
/// from any thread at any time and never block on room activity.
pub struct WorkerDetector {
    inner: Arc<Inner>,
}

impl WorkerDetector {
    pub fn new(
        room_name: impl Into<String>,
        transport: Arc<dyn Transport>,
        bus: Arc<dyn EventBus>,
    ) -> Result<Self, DetectorError> {
        let room_name = room_name.into();
        if room_name.trim().is_empty() {
            return Err(DetectorError::InvalidRoomName(room_name));
        }

        let registry = Arc::new(MemberRegistry::new());
        let processor = StatusProcessor::new(registry, EventEmitter::new(bus));
        Ok(Self {
            inner: Arc::new(Inner {
                room_name,
                transport,
                processor,
                link: Mutex::new(Link {
                    phase: Phase::Disconnected,
                    generation: 0,
                    subscribed: false,
                    transport_listener: None,
                }),
            }),
        })
    }

    /// Build a detector for the configured room, or `None` when no room is
    /// configured (worker detection disabled).
    pub fn from_settings(
        settings: &DetectorSettings,
        transport: Arc<dyn Transport>,
        bus: Arc<dyn EventBus>,
    ) -> Option<Self> {
        let Some(room) = settings.room_name() else {
            info!("no brewery room configured, worker detection disabled");
            return None;
        };
        // room_name() never returns a blank name
        Self::new(room, transport, bus).ok()
    }

    pub fn room_name(&self) -> &str {
        &self.inner.room_name
    }

    /// Subscribe to transport state and join right away if already connected.
    /// Calling it again is a no-op.
    #[instrument(skip(self), fields(room = %self.inner.room_name))]
    pub fn init(&self) {
        {
            let mut link = self.inner.link.lock();
            if link.subscribed {
                debug!("detector already initialized");
                return;
            }
            link.subscribed = true;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let listener: StateListener = Arc::new(move |state: ConnectionState| {
            if let Some(inner) = weak.upgrade() {
                inner.on_connection_state(state);
            }
        });
        let id = self.inner.transport.add_state_listener(listener);
        {
            let mut link = self.inner.link.lock();
            if !link.subscribed {
                // disposed while registering
                drop(link);
                self.inner.transport.remove_state_listener(id);
                return;
            }
            link.transport_listener = Some(id);
        }

        if self.inner.transport.is_connected() {
            self.inner.start();
        }
    }

    /// Unsubscribe from the transport and leave the room, announcing every
    /// known worker as offline.
    #[instrument(skip(self), fields(room = %self.inner.room_name))]
    pub fn dispose(&self) {
        let listener = {
            let mut link = self.inner.link.lock();
            link.subscribed = false;
            link.transport_listener.take()
        };
        if let Some(id) = listener {
            self.inner.transport.remove_state_listener(id);
        }
        self.inner.stop();
    }

    /// Address of the first idle worker, if any.
    pub fn select_worker(&self) -> Option<WorkerId> {
        let workers = self.workers();
        selection::select_idle(&workers).map(|w| w.id.clone())
    }

    /// Whether any worker is present in the room, idle or not.
    pub fn is_any_worker_connected(&self) -> bool {
        selection::any_connected(&self.workers())
    }

    /// Snapshot of known workers in registration order.
    pub fn workers(&self) -> Arc<Vec<Worker>> {
        self.inner.processor.registry().snapshot()
    }

    pub fn status_of(&self, worker: &WorkerId) -> Option<WorkerStatus> {
        self.inner.processor.registry().find(worker).map(|w| w.status)
    }

    pub fn state(&self) -> LinkState {
        match self.inner.link.lock().phase {
            Phase::Disconnected => LinkState::Disconnected,
            Phase::Joining => LinkState::Joining,
            Phase::Joined(_) => LinkState::Joined,
        }
    }
}

impl Inner {
    fn on_connection_state(self: &Arc<Self>, state: ConnectionState) {
        if state.is_connected() {
            self.start();
        } else if state.is_disconnect() {
            self.stop();
        } else {
            debug!(room = %self.room_name, ?state, "ignoring transport state");
        }
    }

    /// Join the room unless already joined or joining.
    fn start(self: &Arc<Self>) {
        let generation = {
            let mut link = self.link.lock();
            if !matches!(link.phase, Phase::Disconnected) {
                debug!(room = %self.room_name, "room already joined or joining");
                return;
            }
            link.phase = Phase::Joining;
            link.generation += 1;
            link.generation
        };

        match self.join_room(generation) {
            Ok(joined) => {
                let mut link = self.link.lock();
                if link.generation == generation && matches!(link.phase, Phase::Joining) {
                    link.phase = Phase::Joined(joined);
                    info!(room = %self.room_name, "joined brewery room");
                } else {
                    // stopped while the join was in flight
                    drop(link);
                    joined.release();
                    debug!(room = %self.room_name, "join superseded, left room again");
                }
            }
            Err(source) => {
                let source_kind = source.error_kind();
                let err = DetectorError::ChannelJoinFailed {
                    room: self.room_name.clone(),
                    source,
                };
                error!(
                    room = %self.room_name,
                    error = %err,
                    error_kind = err.category(),
                    source_kind,
                    "failed to join brewery room"
                );

                let mut link = self.link.lock();
                if link.generation == generation && matches!(link.phase, Phase::Joining) {
                    // occupants replayed before the failure must not outlive the attempt
                    link.generation += 1;
                    link.phase = Phase::Disconnected;
                    let drained = self.processor.drain();
                    if drained > 0 {
                        info!(room = %self.room_name, drained, "cleared workers seen during failed join");
                    }
                }
            }
        }
    }

    fn join_room(self: &Arc<Self>, generation: u64) -> Result<JoinedRoom, ChannelError> {
        let room = self.transport.create_room(&self.room_name)?;

        let weak = Arc::downgrade(self);
        let listener: MemberListener = Arc::new(move |event: &MemberEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.on_member_event(generation, event);
            }
        });
        let listener_id = room.add_member_listener(listener);

        if let Err(err) = room.join() {
            room.remove_member_listener(listener_id);
            return Err(err);
        }

        Ok(JoinedRoom {
            room,
            listener: listener_id,
        })
    }

    /// Leave the room (if joined) and drain the registry.
    fn stop(&self) {
        let previous = {
            let mut link = self.link.lock();
            link.generation += 1;
            let previous = std::mem::replace(&mut link.phase, Phase::Disconnected);
            let drained = self.processor.drain();
            if drained > 0 {
                info!(room = %self.room_name, drained, "cleared known workers");
            }
            previous
        };

        if let Phase::Joined(joined) = previous {
            joined.release();
            info!(room = %self.room_name, "left brewery room");
        }
    }

    fn on_member_event(&self, generation: u64, event: &MemberEvent) {
        let worker = &event.member.address;
        let Some(status) = presence::status_update(event) else {
            debug!(worker = %worker, kind = ?event.kind, "presence without worker status");
            return;
        };

        let link = self.link.lock();
        if !link.is_current(generation) {
            debug!(worker = %worker, kind = ?event.kind, "dropping notification from a left room");
            return;
        }
        let outcome = self.processor.observe(worker, status);
        debug!(worker = %worker, ?outcome, "presence processed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewery_core::WorkerEvent;
    use brewery_core::logging::capture_logs;
    use brewery_core::{MemberEventKind, PresencePayload, RoomMember};
    use tokio::sync::broadcast;
    use tracing::Level;

    use crate::bus::BroadcastBus;
    use crate::local::{LocalRoom, LocalTransport};

    const ROOM: &str = "brewery@internal.example.com";

    struct Harness {
        transport: Arc<LocalTransport>,
        detector: WorkerDetector,
        events: broadcast::Receiver<WorkerEvent>,
    }

    fn harness(transport: LocalTransport) -> Harness {
        let transport = Arc::new(transport);
        let bus = Arc::new(BroadcastBus::new(256));
        let events = bus.subscribe();
        let detector = WorkerDetector::new(ROOM, transport.clone(), bus).unwrap();
        Harness {
            transport,
            detector,
            events,
        }
    }

    fn id(nick: &str) -> WorkerId {
        WorkerId::from_raw(format!("{ROOM}/{nick}"))
    }

    fn status(s: WorkerStatus) -> Option<PresencePayload> {
        Some(PresencePayload::with_status(&s))
    }

    fn take_events(rx: &mut broadcast::Receiver<WorkerEvent>) -> Vec<WorkerEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    /// What happens once the wrapped room has replayed its occupants.
    #[derive(Clone, Copy)]
    enum OnJoin {
        /// The transport drops while the join is still in flight.
        Disconnect,
        /// The room rejects the join after delivering occupants.
        Reject,
    }

    struct ScriptedRoom {
        room: Arc<LocalRoom>,
        transport: Arc<LocalTransport>,
        on_join: OnJoin,
    }

    impl PresenceRoom for ScriptedRoom {
        fn name(&self) -> &str {
            self.room.name()
        }

        fn join(&self) -> Result<(), ChannelError> {
            self.room.join()?;
            match self.on_join {
                OnJoin::Disconnect => {
                    self.transport.disconnect();
                    Ok(())
                }
                OnJoin::Reject => {
                    self.room.leave();
                    Err(ChannelError::JoinRejected("conflict".into()))
                }
            }
        }

        fn leave(&self) {
            self.room.leave();
        }

        fn add_member_listener(&self, listener: MemberListener) -> ListenerId {
            self.room.add_member_listener(listener)
        }

        fn remove_member_listener(&self, id: ListenerId) {
            self.room.remove_member_listener(id);
        }
    }

    struct ScriptedTransport {
        transport: Arc<LocalTransport>,
        on_join: OnJoin,
    }

    impl Transport for ScriptedTransport {
        fn is_connected(&self) -> bool {
            self.transport.is_connected()
        }

        fn add_state_listener(&self, listener: StateListener) -> ListenerId {
            self.transport.add_state_listener(listener)
        }

        fn remove_state_listener(&self, id: ListenerId) {
            self.transport.remove_state_listener(id);
        }

        fn create_room(&self, name: &str) -> Result<Arc<dyn PresenceRoom>, ChannelError> {
            let room: Arc<dyn PresenceRoom> = Arc::new(ScriptedRoom {
                room: self.transport.room_or_create(name),
                transport: Arc::clone(&self.transport),
                on_join: self.on_join,
            });
            Ok(room)
        }
    }

    /// Connected harness whose room already holds an idle worker `a`.
    fn scripted(on_join: OnJoin) -> (Harness, Arc<LocalRoom>) {
        let transport = Arc::new(LocalTransport::connected());
        let room = transport.room_or_create(ROOM);
        room.member_joined(&id("a"), status(WorkerStatus::Idle));

        let bus = Arc::new(BroadcastBus::new(256));
        let events = bus.subscribe();
        let scripted = Arc::new(ScriptedTransport {
            transport: Arc::clone(&transport),
            on_join,
        });
        let detector = WorkerDetector::new(ROOM, scripted, bus).unwrap();
        let harness = Harness {
            transport,
            detector,
            events,
        };
        (harness, room)
    }

    #[test]
    fn blank_room_name_is_rejected() {
        let result = WorkerDetector::new(
            "  ",
            Arc::new(LocalTransport::new()),
            Arc::new(BroadcastBus::new(4)),
        );
        assert!(matches!(result, Err(DetectorError::InvalidRoomName(_))));
    }

    #[test]
    fn from_settings_without_room_is_disabled() {
        let settings = DetectorSettings::default();
        let detector = WorkerDetector::from_settings(
            &settings,
            Arc::new(LocalTransport::new()),
            Arc::new(BroadcastBus::new(4)),
        );
        assert!(detector.is_none());
    }

    #[test]
    fn from_settings_uses_configured_room() {
        let settings = DetectorSettings {
            room: Some(ROOM.into()),
            ..Default::default()
        };
        let detector = WorkerDetector::from_settings(
            &settings,
            Arc::new(LocalTransport::new()),
            Arc::new(BroadcastBus::new(4)),
        )
        .unwrap();
        assert_eq!(detector.room_name(), ROOM);
    }

    #[test]
    fn init_while_disconnected_waits_for_connection() {
        let h = harness(LocalTransport::new());
        h.detector.init();
        assert_eq!(h.detector.state(), LinkState::Disconnected);
        assert_eq!(h.transport.create_calls(), 0);

        h.transport.connect();
        assert_eq!(h.detector.state(), LinkState::Joined);
        assert!(h.transport.room(ROOM).unwrap().is_joined());
    }

    #[test]
    fn init_twice_registers_one_listener() {
        let h = harness(LocalTransport::connected());
        h.detector.init();
        h.detector.init();
        assert_eq!(h.transport.listener_count(), 1);
        assert_eq!(h.transport.room(ROOM).unwrap().join_count(), 1);
    }

    #[test]
    fn occupants_present_before_join_are_registered() {
        let h = harness(LocalTransport::connected());
        let room = h.transport.room_or_create(ROOM);
        room.member_joined(&id("a"), status(WorkerStatus::Busy));
        room.member_joined(&id("b"), status(WorkerStatus::Idle));

        h.detector.init();
        assert_eq!(h.detector.workers().len(), 2);
        assert_eq!(h.detector.select_worker(), Some(id("b")));
    }

    #[test]
    fn join_failure_is_logged_and_retried_on_next_connect() {
        let (logs, _guard) = capture_logs();
        let h = harness(LocalTransport::connected());
        h.transport
            .room_or_create(ROOM)
            .fail_next_join(ChannelError::JoinRejected("not-authorized".into()));

        h.detector.init();
        assert_eq!(h.detector.state(), LinkState::Disconnected);
        let room = h.transport.room(ROOM).unwrap();
        assert_eq!(room.listener_count(), 0);

        let failures = logs.matching("failed to join brewery room");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].level, Level::ERROR);
        assert_eq!(failures[0].field("error_kind"), Some("channel_join_failed"));
        assert_eq!(failures[0].field("source_kind"), Some("join_rejected"));

        h.transport.connect();
        assert_eq!(h.detector.state(), LinkState::Joined);
        assert_eq!(room.join_count(), 1);
    }

    #[test]
    fn disconnect_during_join_releases_room() {
        let (mut h, room) = scripted(OnJoin::Disconnect);
        h.detector.init();

        assert_eq!(h.detector.state(), LinkState::Disconnected);
        assert!(h.detector.workers().is_empty());
        assert!(!room.is_joined());
        assert_eq!(room.listener_count(), 0);
        assert_eq!(
            take_events(&mut h.events),
            vec![
                WorkerEvent::availability(id("a"), true),
                WorkerEvent::offline(id("a")),
            ]
        );

        // a late notification from the released room changes nothing
        room.member_joined(&id("b"), status(WorkerStatus::Idle));
        assert!(h.detector.workers().is_empty());
    }

    #[test]
    fn failed_join_clears_replayed_occupants() {
        let (logs, _guard) = capture_logs();
        let (mut h, room) = scripted(OnJoin::Reject);
        h.detector.init();

        assert_eq!(h.detector.state(), LinkState::Disconnected);
        assert!(h.detector.workers().is_empty());
        assert!(!h.detector.is_any_worker_connected());
        assert_eq!(room.listener_count(), 0);
        assert_eq!(
            take_events(&mut h.events),
            vec![
                WorkerEvent::availability(id("a"), true),
                WorkerEvent::offline(id("a")),
            ]
        );
        let failures = logs.matching("failed to join brewery room");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field("source_kind"), Some("join_rejected"));
    }

    #[test]
    fn concurrent_init_registers_one_listener() {
        let h = harness(LocalTransport::new());
        let detector = Arc::new(h.detector);
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let detector = Arc::clone(&detector);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let _ = barrier.wait();
                    detector.init();
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
        assert_eq!(h.transport.listener_count(), 1);

        detector.dispose();
        assert_eq!(h.transport.listener_count(), 0);

        // disposed detectors can be initialized again
        detector.init();
        assert_eq!(h.transport.listener_count(), 1);
    }

    #[test]
    fn create_failure_stays_disconnected() {
        let h = harness(LocalTransport::connected());
        h.transport.fail_next_create(ChannelError::NotSupported);
        h.detector.init();
        assert_eq!(h.detector.state(), LinkState::Disconnected);
        assert!(h.transport.room(ROOM).is_none());
    }

    #[test]
    fn connection_failed_state_leaves_room() {
        let mut h = harness(LocalTransport::connected());
        h.detector.init();
        h.transport.room(ROOM).unwrap().member_joined(&id("a"), status(WorkerStatus::Idle));
        let _ = h.events.try_recv();

        h.transport.set_state(ConnectionState::ConnectionFailed);
        assert_eq!(h.detector.state(), LinkState::Disconnected);
        assert_eq!(h.events.try_recv().unwrap(), WorkerEvent::offline(id("a")));
    }

    #[test]
    fn registering_state_is_ignored() {
        let h = harness(LocalTransport::connected());
        h.detector.init();
        h.transport.set_state(ConnectionState::Registering);
        assert_eq!(h.detector.state(), LinkState::Joined);
    }

    #[test]
    fn dispose_unsubscribes_and_leaves() {
        let mut h = harness(LocalTransport::connected());
        h.detector.init();
        let room = h.transport.room(ROOM).unwrap();
        room.member_joined(&id("a"), status(WorkerStatus::Busy));
        let _ = h.events.try_recv();

        h.detector.dispose();
        assert_eq!(h.transport.listener_count(), 0);
        assert_eq!(room.listener_count(), 0);
        assert!(!room.is_joined());
        assert!(!h.detector.is_any_worker_connected());
        assert_eq!(h.events.try_recv().unwrap(), WorkerEvent::offline(id("a")));

        // no longer reacts to the transport
        h.transport.connect();
        assert_eq!(h.detector.state(), LinkState::Disconnected);
    }

    #[test]
    fn late_notification_after_leave_is_dropped() {
        let h = harness(LocalTransport::connected());
        h.detector.init();
        let joined_generation = h.detector.inner.link.lock().generation;
        let late = MemberEvent::new(
            MemberEventKind::Joined,
            RoomMember::new(id("a"), status(WorkerStatus::Idle)),
        );

        h.transport.disconnect();
        h.detector.inner.on_member_event(joined_generation, &late);
        assert!(h.detector.workers().is_empty());

        // still stale after a fresh join
        h.transport.connect();
        h.detector.inner.on_member_event(joined_generation, &late);
        assert!(h.detector.workers().is_empty());

        let current = h.detector.inner.link.lock().generation;
        h.detector.inner.on_member_event(current, &late);
        assert_eq!(h.detector.select_worker(), Some(id("a")));
    }

    #[test]
    fn departure_kinds_all_remove() {
        let h = harness(LocalTransport::connected());
        h.detector.init();
        let room = h.transport.room(ROOM).unwrap();
        for (nick, kind) in [
            ("a", MemberEventKind::Left),
            ("b", MemberEventKind::Kicked),
            ("c", MemberEventKind::Quit),
        ] {
            room.member_joined(&id(nick), status(WorkerStatus::Idle));
            assert!(h.detector.status_of(&id(nick)).is_some());
            room.member_departed(&id(nick), kind);
            assert!(h.detector.status_of(&id(nick)).is_none());
        }
    }
}
