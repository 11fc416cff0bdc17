//! Keyboard shortcut commands.
//!
//! Each recognized command toggles one boolean setting. The toggle is a plain
//! read followed by a write: a concurrent writer of the same key (a second
//! shortcut press, the options page) may land between the two and the last
//! write wins. The host storage offers no lock or compare-and-set.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::settings::{keys, SettingsMap, Store, StoreResult};

/// Toggles the "hide videos" checkbox.
pub const TOGGLE_HIDE_VIDEOS_COMMAND: &str = "toggle-hide-videos-checkbox";

/// Toggles the "view threshold" checkbox.
pub const TOGGLE_VIEW_THRESHOLD_COMMAND: &str = "toggle-view-threshold-checkbox";

/// The setting a command toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBinding {
    pub key: String,
    pub default: bool,
}

impl CommandBinding {
    pub fn new(key: impl Into<String>, default: bool) -> Self {
        Self {
            key: key.into(),
            default,
        }
    }
}

/// Result of dispatching a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command is not bound to a setting.
    Ignored,
    /// The setting now holds `value`.
    Toggled { key: String, value: bool },
    /// The store rejected the read or the write.
    Failed { key: String },
}

/// Maps command identifiers to boolean setting toggles.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    store: Store,
    bindings: Arc<HashMap<String, CommandBinding>>,
}

impl CommandRouter {
    /// Router with the shortcuts shipped in the extension manifest.
    pub fn new(store: Store) -> Self {
        Self::with_bindings(store, standard_bindings())
    }

    pub fn with_bindings(store: Store, bindings: HashMap<String, CommandBinding>) -> Self {
        Self {
            store,
            bindings: Arc::new(bindings),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Binding for `command`, matched exactly and case-sensitively.
    pub fn binding(&self, command: &str) -> Option<&CommandBinding> {
        self.bindings.get(command)
    }

    /// Run the toggle bound to `command`. Unbound commands do nothing.
    pub async fn dispatch(&self, command: &str) -> CommandOutcome {
        let Some(binding) = self.binding(command) else {
            tracing::trace!(command, "ignoring unbound command");
            return CommandOutcome::Ignored;
        };

        match self.toggle(&binding.key, binding.default).await {
            Ok(value) => {
                tracing::debug!(command, key = %binding.key, value, "toggled setting");
                CommandOutcome::Toggled {
                    key: binding.key.clone(),
                    value,
                }
            }
            Err(_) => CommandOutcome::Failed {
                key: binding.key.clone(),
            },
        }
    }

    /// Flip the boolean stored under `key`, starting from `default` when
    /// unset. Returns the value written.
    pub async fn toggle(&self, key: &str, default: bool) -> StoreResult<bool> {
        let current = self.store.get_value(key, Value::Bool(default)).await?;

        let current = match current {
            Value::Bool(b) => b,
            other => {
                tracing::warn!(
                    key,
                    value = %other,
                    "persisted value is not a boolean, toggling from default"
                );
                default
            }
        };

        let mut update = SettingsMap::new();
        update.insert(key.to_string(), Value::Bool(!current));
        self.store.set(update).await?;
        Ok(!current)
    }
}

fn standard_bindings() -> HashMap<String, CommandBinding> {
    HashMap::from([
        (
            TOGGLE_HIDE_VIDEOS_COMMAND.to_string(),
            CommandBinding::new(keys::HIDE_VIDEOS_CHECKBOX, false),
        ),
        (
            TOGGLE_VIEW_THRESHOLD_COMMAND.to_string(),
            CommandBinding::new(keys::VIEW_THRESHOLD_CHECKBOX, true),
        ),
    ])
}
