use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{TubefilterError, TubefilterResult};
use crate::settings::{
    DiagnosticLog, JsonFileBackend, MemoryBackend, SettingsRegistry, StorageBackend, Store,
    DEFAULT_DIAGNOSTIC_CAPACITY, DEFAULT_QUOTA_BYTES,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub log: LogConfig,
    pub events: EventsConfig,
}

/// Which storage backend holds the settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// Storage file for the `file` backend.
    pub path: PathBuf,
    /// Size limit of the storage area. 0 disables the limit.
    pub quota_bytes: usize,
    /// Reject reads and writes of keys missing from the registry.
    pub strict_keys: bool,
    /// Number of recent store failures kept for inspection.
    pub diagnostics_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` overrides it.
    pub filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            path: default_storage_path(),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            strict_keys: true,
            diagnostics_capacity: DEFAULT_DIAGNOSTIC_CAPACITY,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "tubefilter=info".to_string(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

impl StorageConfig {
    pub fn quota(&self) -> Option<usize> {
        (self.quota_bytes > 0).then_some(self.quota_bytes)
    }

    /// Open the configured backend and wrap it in a [`Store`].
    pub fn open_store(&self, registry: Arc<SettingsRegistry>) -> TubefilterResult<Store> {
        let backend: Arc<dyn StorageBackend> = match self.backend {
            BackendKind::File => {
                Arc::new(JsonFileBackend::open(&self.path)?.with_quota(self.quota()))
            }
            BackendKind::Memory => match self.quota() {
                Some(quota) => Arc::new(MemoryBackend::with_quota(quota)),
                None => Arc::new(MemoryBackend::new()),
            },
        };
        Ok(Store::new(backend, registry)
            .with_strict_keys(self.strict_keys)
            .with_diagnostics(DiagnosticLog::with_capacity(self.diagnostics_capacity)))
    }
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tubefilter"))
        .unwrap_or_else(|| PathBuf::from(".tubefilter"))
        .join("storage.json")
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("tubefilter")
            .join("config.toml")
    }

    /// Load config from the default path, or return defaults if it is
    /// missing or unreadable.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load config from an explicit path. Errors are returned, not masked.
    pub fn load_from(path: &Path) -> TubefilterResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TubefilterError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Self = toml::from_str(&content)?;
        config.validate();
        Ok(config)
    }

    /// Clamp values to acceptable ranges
    fn validate(&mut self) {
        self.events.channel_capacity = self.events.channel_capacity.clamp(1, 4096);

        if self.log.filter.trim().is_empty() {
            self.log.filter = LogConfig::default().filter;
        }
    }
}
