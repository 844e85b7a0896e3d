//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use brewery_core::logging::LogFormat;
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::BrewerySettings;

/// Env var naming the brewery room.
pub const ENV_ROOM: &str = "BREWERY_ROOM";
/// Env var overriding the log filter directive.
pub const ENV_LOG_LEVEL: &str = "BREWERY_LOG_LEVEL";
/// Env var selecting `compact` or `json` log output.
pub const ENV_LOG_FORMAT: &str = "BREWERY_LOG_FORMAT";
/// Env var overriding the event bus capacity.
pub const ENV_EVENT_CAPACITY: &str = "BREWERY_EVENT_CAPACITY";

/// Resolve the path to the settings file (`~/.brewery/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".brewery").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<BrewerySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON or invalid values are errors.
pub fn load_settings_from_path(path: &Path) -> Result<BrewerySettings> {
    load_with_env(path, |name| std::env::var(name).ok())
}

/// Same as [`load_settings_from_path`] with an explicit env lookup.
pub fn load_with_env(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<BrewerySettings> {
    let defaults = serde_json::to_value(BrewerySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: BrewerySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, env);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `BREWERY_*` overrides. Invalid values are logged and ignored.
pub fn apply_env_overrides(settings: &mut BrewerySettings, env: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = read(ENV_ROOM) {
        settings.detector.room = Some(v);
    }
    if let Some(v) = read(ENV_LOG_LEVEL) {
        settings.logging.level = v;
    }
    if let Some(v) = read(ENV_LOG_FORMAT) {
        match parse_log_format(&v) {
            Some(format) => settings.logging.format = format,
            None => tracing::warn!(key = ENV_LOG_FORMAT, value = %v, "invalid log format env var, ignoring"),
        }
    }
    if let Some(v) = read(ENV_EVENT_CAPACITY) {
        match parse_usize_range(&v, 1, 1_000_000) {
            Some(n) => settings.detector.event_capacity = n,
            None => tracing::warn!(key = ENV_EVENT_CAPACITY, value = %v, "invalid usize env var, ignoring"),
        }
    }
}

/// Parse `compact` / `json` (case-insensitive).
pub fn parse_log_format(val: &str) -> Option<LogFormat> {
    match val.trim().to_lowercase().as_str() {
        "compact" | "text" => Some(LogFormat::Compact),
        "json" => Some(LogFormat::Json),
        _ => None,
    }
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}
