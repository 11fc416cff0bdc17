//! Setting keys and their default values.
//!
//! The registry is the full persisted-state contract shared by the background
//! coordinator, the options page and every content script. Keys must stay
//! stable across versions: renaming one orphans the value users already have.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::SettingsMap;

/// Storage keys understood by the extension.
pub mod keys {
    // Dark Mode
    pub const DARK_MODE_CHECKBOX: &str = "dark-mode-checkbox-state";

    // Filters (Types)
    pub const HIDE_RECOMMENDATIONS_CHECKBOX: &str = "hide-recommendations-checkbox-state";
    pub const HIDE_PLAYLISTS_CHECKBOX: &str = "hide-playlists-checkbox-state";
    pub const HIDE_SEARCHES_CHECKBOX: &str = "hide-searches-checkbox-state";

    // Filters (Pages)
    pub const HIDE_CHANNELS_CHECKBOX: &str = "hide-channels-checkbox-state";
    pub const HIDE_HOME_CHECKBOX: &str = "hide-home-checkbox-state";
    pub const HIDE_EXPLORE_CHECKBOX: &str = "hide-explore-checkbox-state";
    pub const HIDE_LIBRARY_CHECKBOX: &str = "hide-library-checkbox-state";
    pub const HIDE_HISTORY_CHECKBOX: &str = "hide-history-checkbox-state";
    pub const HIDE_SUBSCRIPTIONS_CHECKBOX: &str = "hide-subscriptions-checkbox-state";

    // View Threshold
    pub const VIEW_THRESHOLD_CHECKBOX: &str = "view-threshold-checkbox-state";
    pub const VIEW_THRESHOLD_SLIDER: &str = "view-threshold-slider-value";

    // Hide Videos
    pub const HIDE_VIDEOS_CHECKBOX: &str = "hide-videos-checkbox-state";
    pub const HIDE_VIDEOS_BOOKMARKS: &str = "hide-videos-bookmarks";
}

/// Window over which content scripts batch their poll requests.
pub const BATCH_TIME: Duration = Duration::from_millis(50);

/// Default view threshold slider position.
pub const VIEW_THRESHOLD_SLIDER_DEFAULT: u64 = 90;

/// A default value a setting can take.
///
/// Serialized untagged so a default is persisted as plain JSON (`true`, `90`,
/// `{}`), exactly like a value written by the options page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(Number),
    /// Sparse set / bookmark table keyed by string.
    Map(Map<String, Value>),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<u64> for SettingValue {
    fn from(value: u64) -> Self {
        SettingValue::Number(value.into())
    }
}

impl From<SettingValue> for Value {
    fn from(value: SettingValue) -> Self {
        match value {
            SettingValue::Bool(b) => Value::Bool(b),
            SettingValue::Number(n) => Value::Number(n),
            SettingValue::Map(m) => Value::Object(m),
        }
    }
}

/// One registered setting.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingEntry {
    pub key: String,
    pub default: SettingValue,
}

impl SettingEntry {
    pub fn new(key: impl Into<String>, default: impl Into<SettingValue>) -> Self {
        Self {
            key: key.into(),
            default: default.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Setting '{0}' is registered more than once")]
    DuplicateKey(String),
}

/// Immutable mapping from setting key to default value.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsRegistry {
    entries: BTreeMap<String, SettingValue>,
}

impl SettingsRegistry {
    /// Build a registry, rejecting duplicate keys.
    pub fn new(entries: impl IntoIterator<Item = SettingEntry>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            if map.insert(entry.key.clone(), entry.default).is_some() {
                return Err(RegistryError::DuplicateKey(entry.key));
            }
        }
        Ok(Self { entries: map })
    }

    /// The settings shipped with the extension.
    pub fn standard() -> Self {
        let entries = standard_entries()
            .into_iter()
            .map(|entry| (entry.key, entry.default))
            .collect();
        Self { entries }
    }

    pub fn default_for(&self, key: &str) -> Option<&SettingValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Defaults for the given keys, skipping keys that are not registered.
    pub fn defaults_for<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> SettingsMap {
        keys.into_iter()
            .filter_map(|key| {
                self.entries
                    .get(key)
                    .map(|value| (key.to_string(), Value::from(value.clone())))
            })
            .collect()
    }

    /// Every registered default.
    pub fn all_defaults(&self) -> SettingsMap {
        self.defaults_for(self.keys())
    }

    /// Defaults content scripts request when deciding what to filter.
    ///
    /// Dark mode belongs to the options page and is not part of this set.
    pub fn filter_defaults(&self) -> SettingsMap {
        self.defaults_for(self.keys().filter(|key| *key != keys::DARK_MODE_CHECKBOX))
    }
}

impl Default for SettingsRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_entries() -> Vec<SettingEntry> {
    vec![
        SettingEntry::new(keys::DARK_MODE_CHECKBOX, false),
        SettingEntry::new(keys::HIDE_RECOMMENDATIONS_CHECKBOX, true),
        SettingEntry::new(keys::HIDE_PLAYLISTS_CHECKBOX, true),
        SettingEntry::new(keys::HIDE_SEARCHES_CHECKBOX, true),
        SettingEntry::new(keys::HIDE_CHANNELS_CHECKBOX, true),
        SettingEntry::new(keys::HIDE_HOME_CHECKBOX, true),
        SettingEntry::new(keys::HIDE_EXPLORE_CHECKBOX, true),
        SettingEntry::new(keys::HIDE_LIBRARY_CHECKBOX, true),
        SettingEntry::new(keys::HIDE_HISTORY_CHECKBOX, false),
        SettingEntry::new(keys::HIDE_SUBSCRIPTIONS_CHECKBOX, true),
        SettingEntry::new(keys::VIEW_THRESHOLD_CHECKBOX, true),
        SettingEntry::new(keys::VIEW_THRESHOLD_SLIDER, VIEW_THRESHOLD_SLIDER_DEFAULT),
        SettingEntry::new(keys::HIDE_VIDEOS_CHECKBOX, false),
        SettingEntry::new(keys::HIDE_VIDEOS_BOOKMARKS, SettingValue::Map(Map::new())),
    ]
}
