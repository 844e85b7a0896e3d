//! Worker status as announced in presence.

use std::fmt;

/// Status a worker advertises in its presence.
///
/// `Undefined` is a transient signal meaning "remove if present" and is never
/// stored by the detector. `Unrecognized` keeps the raw value of anything the
/// detector does not understand so it can be reported.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WorkerStatus {
    Idle,
    Busy,
    Undefined,
    Unrecognized(String),
}

impl WorkerStatus {
    /// Parse the wire value (case-insensitive). Never fails: unknown values
    /// become [`WorkerStatus::Unrecognized`].
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("idle") {
            Self::Idle
        } else if trimmed.eq_ignore_ascii_case("busy") {
            Self::Busy
        } else if trimmed.eq_ignore_ascii_case("undefined") {
            Self::Undefined
        } else {
            Self::Unrecognized(raw.to_owned())
        }
    }

    /// Canonical wire value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => "IDLE",
            Self::Busy => "BUSY",
            Self::Undefined => "UNDEFINED",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Availability carried by the status, `None` when it says nothing about
    /// availability (undefined or unrecognized).
    pub fn availability(&self) -> Option<bool> {
        match self {
            Self::Idle => Some(true),
            Self::Busy => Some(false),
            Self::Undefined | Self::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
