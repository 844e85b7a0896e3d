//! # brewery-detector
//!
//! Presence-based worker registry and selector.
//!
//! Workers announce IDLE/BUSY in their presence inside a shared room. The
//! [`WorkerDetector`] joins that room whenever the transport is connected,
//! folds member notifications into a [`MemberRegistry`], publishes
//! [`WorkerEvent`](brewery_core::WorkerEvent)s for every transition, and
//! answers "which worker is idle?" on demand.
//!
//! ```text
//! transport state ──▶ WorkerDetector ──join/leave──▶ PresenceRoom
//!                                                      │ member events
//!                          presence::status_update ◀───┘
//!                                     │
//!                          StatusProcessor ──▶ MemberRegistry ◀── selection
//!                                     │
//!                              EventEmitter ──▶ EventBus
//! ```

#![deny(unsafe_code)]

pub mod bus;
pub mod detector;
pub mod emitter;
pub mod errors;
pub mod local;
pub mod presence;
pub mod processor;
pub mod registry;
pub mod selection;

pub use bus::BroadcastBus;
pub use detector::{LinkState, WorkerDetector};
pub use emitter::EventEmitter;
pub use errors::DetectorError;
pub use local::{LocalRoom, LocalTransport};
pub use processor::{Observation, StatusProcessor};
pub use registry::{MemberRegistry, Upsert, Worker};
