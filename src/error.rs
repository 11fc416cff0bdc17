//! Error types for tubefilter.

use thiserror::Error;

use crate::settings::{BackendFailure, StoreError};

/// Errors that can occur while setting up or running the coordinator.
#[derive(Debug, Error)]
pub enum TubefilterError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage backend could not be opened
    #[error("Storage error: {0}")]
    Backend(#[from] BackendFailure),

    /// Settings store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The event loop has stopped and accepts no more events
    #[error("Event loop is not running")]
    EventLoopClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for tubefilter operations
pub type TubefilterResult<T> = Result<T, TubefilterError>;
