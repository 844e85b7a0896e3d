//! Settings type definitions.
//!
//! Field names are camelCase on the wire. Every section is
//! `#[serde(default)]`, so partial JSON fills in compiled defaults.

use brewery_core::logging::LogFormat;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "detector": { "room": "brewery@internal.auth.example.com" },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrewerySettings {
    /// Settings schema version.
    pub version: String,
    pub detector: DetectorSettings,
    pub logging: LoggingSettings,
}

impl Default for BrewerySettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            detector: DetectorSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl BrewerySettings {
    /// Reject values the detector cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.detector.event_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "detector.eventCapacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Worker detection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorSettings {
    /// Name of the room all workers gather in. Unset disables detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    /// Buffer size of the broadcast event bus.
    pub event_capacity: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            room: None,
            event_capacity: 256,
        }
    }
}

impl DetectorSettings {
    /// Configured room name, `None` when unset or blank.
    pub fn room_name(&self) -> Option<&str> {
        self.room
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, overridden by `RUST_LOG`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LoggingSettings {
    /// Install the global subscriber with this level and format. Returns
    /// `false` if one was already installed.
    pub fn init_subscriber(&self) -> bool {
        brewery_core::logging::init_subscriber(&self.level, self.format)
    }
}
