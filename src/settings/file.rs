//! JSON file storage backend.
//!
//! Persists the storage area as a single JSON object. Contents are cached in
//! memory and every write goes through to disk before it is acknowledged.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::backend::{check_quota, select, StorageBackend, DEFAULT_QUOTA_BYTES};
use super::error::BackendFailure;
use super::SettingsMap;

/// File-backed storage area.
#[derive(Debug)]
pub struct JsonFileBackend {
    /// Path to the storage file.
    path: PathBuf,
    /// In-memory copy of the file.
    cache: RwLock<SettingsMap>,
    /// Maximum serialized size, if any.
    quota: Option<usize>,
}

impl JsonFileBackend {
    /// Open the storage file at `path`.
    ///
    /// A missing file is an empty storage area. A file that exists but does
    /// not parse is an error so that user data is never overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BackendFailure> {
        let path = path.into();

        let cache = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                SettingsMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            SettingsMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
            quota: Some(DEFAULT_QUOTA_BYTES),
        })
    }

    /// Override the quota. `None` disables quota checks.
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, contents: &SettingsMap) -> Result<(), BackendFailure> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                BackendFailure::Unavailable(format!(
                    "failed to create storage directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let serialized = serde_json::to_vec(contents)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serialized).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for JsonFileBackend {
    async fn get(&self, keys: &[String]) -> Result<SettingsMap, BackendFailure> {
        Ok(select(&*self.cache.read().await, keys))
    }

    async fn set(&self, items: SettingsMap) -> Result<(), BackendFailure> {
        let mut cache = self.cache.write().await;
        let mut next = cache.clone();
        next.extend(items);
        check_quota(&next, self.quota)?;

        self.write(&next).await?;
        *cache = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn items(value: serde_json::Value) -> SettingsMap {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_file_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("storage.json");

        {
            let backend = JsonFileBackend::open(&path).unwrap();
            backend
                .set(items(json!({"hide-home-checkbox-state": false})))
                .await
                .unwrap();
        }

        let backend = JsonFileBackend::open(&path).unwrap();
        let values = backend
            .get(&["hide-home-checkbox-state".to_string()])
            .await
            .unwrap();
        assert_eq!(values, items(json!({"hide-home-checkbox-state": false})));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::open(temp_dir.path().join("storage.json")).unwrap();

        let values = backend.get(&["anything".to_string()]).await.unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();

        let err = JsonFileBackend::open(&path).unwrap_err();
        assert!(matches!(err, BackendFailure::Serialization(_)));
    }

    #[tokio::test]
    async fn test_quota_failure_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        let backend = JsonFileBackend::open(&path).unwrap().with_quota(Some(8));

        let err = backend
            .set(items(json!({"hide-videos-bookmarks": {"abc": true}})))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendFailure::QuotaExceeded { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_write_at_quota_is_stored_compactly() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        // 25 key bytes plus 12 bytes of `{"abc":true}`.
        let update = items(json!({"hide-videos-bookmarks-abc": {"abc": true}}));
        let backend = JsonFileBackend::open(&path).unwrap().with_quota(Some(37));

        backend.set(update).await.unwrap();

        let on_disk = fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, r#"{"hide-videos-bookmarks-abc":{"abc":true}}"#);
        let err = backend.set(items(json!({"x": 1}))).await.unwrap_err();
        assert!(matches!(err, BackendFailure::QuotaExceeded { used: 39, quota: 37 }));
    }
}
