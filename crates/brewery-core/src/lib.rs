//! # brewery-core
//!
//! Shared vocabulary for the brewery worker detector.
//!
//! Workers gather in a shared presence room (the "brewery") and publish their
//! status in presence. This crate holds everything the detector and its
//! collaborators agree on:
//!
//! - **Identities**: [`WorkerId`], the member address inside the room
//! - **Statuses**: [`WorkerStatus`] and how it is read from a presence payload
//! - **Events**: [`WorkerEvent`], published when a worker changes state
//! - **Collaborators**: [`Transport`], [`PresenceRoom`] and [`EventBus`] traits
//! - **Errors**: [`ChannelError`] and [`PublishError`] via `thiserror`
//! - **Logging**: `tracing` subscriber setup and test capture helpers

#![deny(unsafe_code)]

pub mod bus;
pub mod errors;
pub mod events;
pub mod ids;
pub mod logging;
pub mod presence;
pub mod room;
pub mod status;
pub mod transport;

pub use bus::EventBus;
pub use errors::{ChannelError, PublishError};
pub use events::WorkerEvent;
pub use ids::{ListenerId, WorkerId};
pub use presence::{PresenceExtension, PresencePayload};
pub use room::{MemberEvent, MemberEventKind, MemberListener, PresenceRoom, RoomMember};
pub use status::WorkerStatus;
pub use transport::{ConnectionState, StateListener, Transport};
