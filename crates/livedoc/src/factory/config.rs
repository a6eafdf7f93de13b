// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Document configuration.
//!
//! A unit exposes its static configuration as a string-keyed map. Known
//! keys are extracted with typed defaults; a key that is missing or holds a
//! value of the wrong type silently falls back to its default, so schemas
//! stay forward and backward compatible.
//!
//! | Key | Type | Default |
//! |-----|------|---------|
//! | `maximum_history` | int | 1000 |
//! | `delete_on_close` | bool | false |
//! | `readonly` | bool | false |
//! | `frequency` | int | 0 (app mode when > 0, delay in ms) |
//! | `temporal_resolution_ms` | int | 0 |
//! | `sweep_export_delay` | int or long | 0 |
//!
//! Int keys accept a long only when it fits in 32 bits.
//! `sweep_export_delay` widens an int to 64 bits.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// One configuration value, typed by its JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Str(String),
    List(Vec<ConfigValue>),
    Map(IndexMap<String, ConfigValue>),
}

pub type ConfigMap = IndexMap<String, ConfigValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentConfig {
    pub maximum_history: i32,
    pub delete_on_close: bool,
    pub readonly: bool,
    pub frequency: i32,
    pub temporal_resolution_ms: i32,
    pub sweep_export_delay: i64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            maximum_history: 1000,
            delete_on_close: false,
            readonly: false,
            frequency: 0,
            temporal_resolution_ms: 0,
            sweep_export_delay: 0,
        }
    }
}

fn int_of(config: &ConfigMap, key: &str, default: i32) -> i32 {
    match config.get(key) {
        Some(ConfigValue::Int(value)) => *value,
        Some(ConfigValue::Long(value)) => i32::try_from(*value).unwrap_or(default),
        _ => default,
    }
}

fn long_of(config: &ConfigMap, key: &str, default: i64) -> i64 {
    match config.get(key) {
        Some(ConfigValue::Int(value)) => i64::from(*value),
        Some(ConfigValue::Long(value)) => *value,
        _ => default,
    }
}

fn bool_of(config: &ConfigMap, key: &str, default: bool) -> bool {
    match config.get(key) {
        Some(ConfigValue::Bool(value)) => *value,
        _ => default,
    }
}

impl DocumentConfig {
    /// Extract the known keys of `config`.
    pub fn from_map(config: &ConfigMap) -> Self {
        let defaults = Self::default();
        Self {
            maximum_history: int_of(config, "maximum_history", defaults.maximum_history),
            delete_on_close: bool_of(config, "delete_on_close", defaults.delete_on_close),
            readonly: bool_of(config, "readonly", defaults.readonly),
            frequency: int_of(config, "frequency", defaults.frequency),
            temporal_resolution_ms: int_of(
                config,
                "temporal_resolution_ms",
                defaults.temporal_resolution_ms,
            ),
            sweep_export_delay: long_of(config, "sweep_export_delay", defaults.sweep_export_delay),
        }
    }

    /// Parse the JSON object a unit reports; anything else yields the
    /// defaults. Entries are converted one by one, so a value with no
    /// [`ConfigValue`] shape (such as `null`) only drops its own key.
    pub fn from_json(json: &str) -> (Self, ConfigMap) {
        let raw = match serde_json::from_str::<Map<String, Value>>(json) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("[factory] unreadable config ({}), using defaults", e);
                return (Self::default(), ConfigMap::new());
            }
        };
        let mut map = ConfigMap::with_capacity(raw.len());
        for (key, value) in raw {
            match serde_json::from_value::<ConfigValue>(value) {
                Ok(value) => {
                    map.insert(key, value);
                }
                Err(_) => log::debug!("[factory] config key '{}' skipped", key),
            }
        }
        (Self::from_map(&map), map)
    }

    /// Tick delay when the document runs in app mode.
    pub fn app_mode(&self) -> Option<Duration> {
        u64::try_from(self.frequency)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> DocumentConfig {
        DocumentConfig::from_json(json).0
    }

    #[test]
    fn test_empty_map_defaults() {
        let config = parse("{}");
        assert_eq!(config.maximum_history, 1000);
        assert!(!config.delete_on_close);
        assert!(!config.readonly);
        assert_eq!(config.frequency, 0);
        assert_eq!(config.temporal_resolution_ms, 0);
        assert_eq!(config.sweep_export_delay, 0);
        assert_eq!(config.app_mode(), None);
    }

    #[test]
    fn test_frequency_enables_app_mode() {
        let config = parse(r#"{"frequency": 5}"#);
        assert_eq!(config.app_mode(), Some(Duration::from_millis(5)));
        assert_eq!(parse(r#"{"frequency": -5}"#).app_mode(), None);
    }

    #[test]
    fn test_mistyped_keys_fall_back() {
        let config = parse(
            r#"{"maximum_history": "lots", "readonly": 1, "delete_on_close": true,
                "temporal_resolution_ms": 3000000000}"#,
        );
        assert_eq!(config.maximum_history, 1000);
        assert!(!config.readonly);
        assert!(config.delete_on_close);
        assert_eq!(config.temporal_resolution_ms, 0);
    }

    #[test]
    fn test_sweep_export_delay_widens() {
        assert_eq!(parse(r#"{"sweep_export_delay": 250}"#).sweep_export_delay, 250);
        assert_eq!(
            parse(r#"{"sweep_export_delay": 8589934592}"#).sweep_export_delay,
            8_589_934_592
        );
    }

    #[test]
    fn test_null_entry_only_drops_itself() {
        let (config, map) = DocumentConfig::from_json(
            r#"{"frequency": 5, "note": null, "readonly": true, "tags": [1, null]}"#,
        );
        assert_eq!(config.frequency, 5);
        assert!(config.readonly);
        assert_eq!(config.app_mode(), Some(Duration::from_millis(5)));
        assert_eq!(map.len(), 2);
        assert!(!map.contains_key("note"));
        assert!(!map.contains_key("tags"));
    }

    #[test]
    fn test_unreadable_config_defaults() {
        let (config, map) = DocumentConfig::from_json("[1, 2]");
        assert_eq!(config, DocumentConfig::default());
        assert!(map.is_empty());
    }
}
