//! Persistent settings.
//!
//! ```text
//! Store
//! ├── registry: Arc<SettingsRegistry>   (key -> default)
//! ├── backend: Arc<dyn StorageBackend>  (MemoryBackend | JsonFileBackend)
//! └── diagnostics: DiagnosticLog        (failed gets/sets)
//! ```
//!
//! Absence of a persisted value is never an error: reads fall back to the
//! default supplied by the caller.

pub mod backend;
mod diagnostics;
mod error;
pub mod file;
pub mod registry;
mod store;

pub use backend::{MemoryBackend, StorageBackend, DEFAULT_QUOTA_BYTES};
pub use diagnostics::{Diagnostic, DiagnosticLog, DEFAULT_DIAGNOSTIC_CAPACITY};
pub use error::{BackendFailure, StoreError, StoreOperation, StoreResult};
pub use file::JsonFileBackend;
pub use registry::{keys, SettingEntry, SettingValue, SettingsRegistry};
pub use store::Store;

/// A set of settings keyed by storage key.
pub type SettingsMap = serde_json::Map<String, serde_json::Value>;
