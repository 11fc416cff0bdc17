//! Settings store with default-value fallback.
//!
//! The store is the only component that talks to the storage backend. Reads
//! take a map of keys to defaults and always answer for every requested key;
//! writes cover the whole map in one backend request. Backend failures are
//! recorded in the [`DiagnosticLog`] and are never retried.

use std::sync::Arc;

use serde_json::Value;

use super::backend::StorageBackend;
use super::diagnostics::{Diagnostic, DiagnosticLog};
use super::error::{StoreError, StoreOperation, StoreResult};
use super::registry::SettingsRegistry;
use super::SettingsMap;

/// Handle to the persisted settings. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StorageBackend>,
    registry: Arc<SettingsRegistry>,
    diagnostics: DiagnosticLog,
    /// Reject keys the registry does not know.
    strict_keys: bool,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("registry", &self.registry.len())
            .field("diagnostics", &self.diagnostics.len())
            .field("strict_keys", &self.strict_keys)
            .finish()
    }
}

impl Store {
    pub fn new(backend: Arc<dyn StorageBackend>, registry: Arc<SettingsRegistry>) -> Self {
        Self {
            backend,
            registry,
            diagnostics: DiagnosticLog::new(),
            strict_keys: true,
        }
    }

    pub fn with_strict_keys(mut self, strict: bool) -> Self {
        self.strict_keys = strict;
        self
    }

    /// Share an existing diagnostic log instead of a fresh one.
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticLog) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn registry(&self) -> &SettingsRegistry {
        &self.registry
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    /// Read `requested` keys, substituting the supplied default for every key
    /// that has no persisted value.
    pub async fn get(&self, requested: &SettingsMap) -> StoreResult<SettingsMap> {
        self.check_keys(requested)?;

        let keys: Vec<String> = requested.keys().cloned().collect();
        let contents = match self.backend.get(&keys).await {
            Ok(contents) => contents,
            Err(e) => return Err(self.report(StoreOperation::Get, keys, e.to_string())),
        };

        Ok(requested
            .iter()
            .map(|(key, default)| {
                let value = contents.get(key).cloned().unwrap_or_else(|| default.clone());
                (key.clone(), value)
            })
            .collect())
    }

    /// Read `keys` with the defaults from the registry.
    pub async fn get_registered(&self, keys: &[&str]) -> StoreResult<SettingsMap> {
        if let Some(unknown) = keys.iter().find(|key| !self.registry.contains(key)) {
            return Err(self.unknown_key(unknown));
        }
        self.get(&self.registry.defaults_for(keys.iter().copied()))
            .await
    }

    /// Read a single key with an explicit default.
    pub async fn get_value(&self, key: &str, default: Value) -> StoreResult<Value> {
        let mut requested = SettingsMap::new();
        requested.insert(key.to_string(), default.clone());
        let mut values = self.get(&requested).await?;
        Ok(values.remove(key).unwrap_or(default))
    }

    /// Persist every entry of `values` in one backend request.
    pub async fn set(&self, values: SettingsMap) -> StoreResult<()> {
        self.check_keys(&values)?;

        let keys: Vec<String> = values.keys().cloned().collect();
        match self.backend.set(values).await {
            Ok(()) => {
                tracing::trace!(keys = ?keys, "stored settings");
                Ok(())
            }
            Err(e) => Err(self.report(StoreOperation::Set, keys, e.to_string())),
        }
    }

    /// Read `requested` and hand the values to `callback`.
    ///
    /// On failure the callback is dropped without being called; the failure is
    /// only visible in the diagnostic log.
    pub async fn get_then<F>(&self, requested: &SettingsMap, callback: F)
    where
        F: FnOnce(SettingsMap),
    {
        if let Ok(values) = self.get(requested).await {
            callback(values);
        }
    }

    /// Persist `values`, then call `callback` if one is supplied and the write
    /// succeeded.
    pub async fn set_then<F>(&self, values: SettingsMap, callback: Option<F>)
    where
        F: FnOnce(),
    {
        if self.set(values).await.is_ok() {
            if let Some(callback) = callback {
                callback();
            }
        }
    }

    fn check_keys(&self, items: &SettingsMap) -> StoreResult<()> {
        if !self.strict_keys {
            return Ok(());
        }
        match items.keys().find(|key| !self.registry.contains(key)) {
            Some(unknown) => Err(self.unknown_key(unknown)),
            None => Ok(()),
        }
    }

    fn unknown_key(&self, key: &str) -> StoreError {
        tracing::warn!(key, "rejected unregistered setting");
        StoreError::UnknownKey(key.to_string())
    }

    fn report(&self, operation: StoreOperation, keys: Vec<String>, message: String) -> StoreError {
        self.diagnostics.record(Diagnostic {
            operation,
            keys: keys.clone(),
            message: message.clone(),
        });
        StoreError::Backend {
            operation,
            keys,
            message,
        }
    }
}
