//! # brewery-settings
//!
//! Configuration for the brewery worker detector, loaded in three layers
//! (in priority order):
//! 1. **Compiled defaults**: [`BrewerySettings::default()`]
//! 2. **User file**: `~/.brewery/settings.json`, deep-merged over defaults
//! 3. **Environment variables**: `BREWERY_*` overrides (highest priority)
//!
//! The one setting the detector cannot run without is the brewery room name
//! ([`DetectorSettings::room`]). Leaving it unset disables worker detection.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

static SETTINGS: OnceLock<BrewerySettings> = OnceLock::new();

/// Get the global settings instance.
///
/// Loaded on first call; falls back to compiled defaults (detection
/// disabled) if loading fails.
pub fn get_settings() -> &'static BrewerySettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            BrewerySettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: BrewerySettings) -> std::result::Result<(), BrewerySettings> {
    SETTINGS.set(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_disable_detection() {
        let settings = BrewerySettings::default();
        assert_eq!(settings.version, "0.1.0");
        assert!(settings.detector.room_name().is_none());
        assert_eq!(settings.detector.event_capacity, 256);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn init_then_get_returns_same_value() {
        let mut settings = BrewerySettings::default();
        settings.detector.room = Some("brewery@internal.example.com".into());
        // another test in this binary may have initialized the global first
        if init_settings(settings).is_ok() {
            assert_eq!(
                get_settings().detector.room_name(),
                Some("brewery@internal.example.com")
            );
        }
    }
}
