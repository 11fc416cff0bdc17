//! tubefilter - background coordinator for a video-site content filter.
//!
//! The background context of the extension owns persisted settings, reacts
//! to global keyboard shortcuts and relays tab events between the browser
//! host and the content scripts that do the actual filtering.
//!
//! # Architecture
//!
//! - [`settings`] - Settings registry and the default-merging [`Store`]
//! - [`router`] - Command toggles and host event handlers
//! - [`host`] - Browser host boundary and the stdio bridge
//! - [`background`] - Single event loop tying the pieces together
//! - [`config`] - Configuration loading
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tubefilter::{Background, CommandRouter, Config, SettingsRegistry, TabEventRouter};
//!
//! let config = Config::load();
//! let store = config.storage.open_store(Arc::new(SettingsRegistry::standard()))?;
//! let router = TabEventRouter::new(CommandRouter::new(store), host);
//! let (background, handle) = Background::new(router, Default::default());
//! tokio::spawn(background.run());
//! ```

pub mod background;
pub mod config;
pub mod host;
pub mod message;
pub mod router;
pub mod settings;

mod error;

pub use background::{Background, BackgroundConfig, BackgroundHandle, LoopStats};
pub use config::Config;
pub use error::{TubefilterError, TubefilterResult};
pub use host::{BrowserHost, DeliveryStatus, HostEvent, TabId};
pub use message::{MessageKind, RuntimeMessage, TabMessage};
pub use router::{CommandOutcome, CommandRouter, TabEventRouter};
pub use settings::{SettingsRegistry, Store};
