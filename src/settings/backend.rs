//! Storage backend abstraction.
//!
//! A backend is the host's asynchronous key-value area. Every call may fail,
//! and a write covers the whole map in a single request.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::error::BackendFailure;
use super::SettingsMap;

/// Default local storage quota of the host (5 MiB).
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Asynchronous, possibly-failing key-value storage.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch the persisted values for `keys`. Keys without a value are absent
    /// from the result.
    async fn get(&self, keys: &[String]) -> Result<SettingsMap, BackendFailure>;

    /// Persist every entry of `items` as one request.
    async fn set(&self, items: SettingsMap) -> Result<(), BackendFailure>;
}

/// Size of a storage area for quota accounting: each key's length plus the
/// length of its value as compact JSON. This is the host's measure, not the
/// size of any file holding the area.
pub(crate) fn bytes_in_use(contents: &SettingsMap) -> Result<usize, BackendFailure> {
    let mut used = 0;
    for (key, value) in contents {
        used += key.len() + serde_json::to_vec(value)?.len();
    }
    Ok(used)
}

pub(crate) fn check_quota(
    contents: &SettingsMap,
    quota: Option<usize>,
) -> Result<(), BackendFailure> {
    if let Some(quota) = quota {
        let used = bytes_in_use(contents)?;
        if used > quota {
            return Err(BackendFailure::QuotaExceeded { used, quota });
        }
    }
    Ok(())
}

pub(crate) fn select(contents: &SettingsMap, keys: &[String]) -> SettingsMap {
    keys.iter()
        .filter_map(|key| contents.get(key).map(|value| (key.clone(), value.clone())))
        .collect()
}

/// In-memory backend. Contents live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    contents: RwLock<SettingsMap>,
    quota: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would grow the area beyond `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            contents: RwLock::default(),
            quota: Some(quota),
        }
    }

    /// Start from existing contents.
    pub fn with_contents(contents: SettingsMap) -> Self {
        Self {
            contents: RwLock::new(contents),
            quota: None,
        }
    }

    /// Copy of the whole area.
    pub async fn snapshot(&self) -> SettingsMap {
        self.contents.read().await.clone()
    }

    pub async fn value(&self, key: &str) -> Option<Value> {
        self.contents.read().await.get(key).cloned()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, keys: &[String]) -> Result<SettingsMap, BackendFailure> {
        Ok(select(&*self.contents.read().await, keys))
    }

    async fn set(&self, items: SettingsMap) -> Result<(), BackendFailure> {
        let mut contents = self.contents.write().await;
        let mut next = contents.clone();
        next.extend(items);
        check_quota(&next, self.quota)?;
        *contents = next;
        Ok(())
    }
}
