//! Background event loop.
//!
//! Host events are queued on a channel and handled one at a time in arrival
//! order:
//! - tab updates and runtime messages are handled inline, so URL
//!   notifications for a tab leave in the order their updates arrived;
//! - commands are spawned, so a slow store never stalls the loop. Two
//!   toggles of the same key may therefore overlap (see [`crate::router::command`]).
//!
//! Dropping the runtime drops in-flight toggles without running them to
//! completion. A graceful [`BackgroundHandle::shutdown`] waits for them.

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::{TubefilterError, TubefilterResult};
use crate::host::HostEvent;
use crate::router::{CommandOutcome, MessageOutcome, TabEventRouter};

/// Configuration for the background loop.
#[derive(Debug, Clone)]
pub struct BackgroundConfig {
    /// Capacity of the inbound event queue.
    pub channel_capacity: usize,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

/// Message types for communicating with the loop.
#[derive(Debug)]
enum LoopMessage {
    /// Handle a host event.
    Event(HostEvent),
    /// Finish in-flight work and stop.
    Shutdown,
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub events: u64,
    pub toggles: u64,
    pub failed_toggles: u64,
    pub url_notifications: u64,
    pub page_actions: u64,
}

/// The background coordinator. Consumed by [`Background::run`].
pub struct Background {
    router: TabEventRouter,
    rx: mpsc::Receiver<LoopMessage>,
    /// Spawned command toggles.
    tasks: JoinSet<CommandOutcome>,
    stats: LoopStats,
}

/// Sending half of the event queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BackgroundHandle {
    tx: mpsc::Sender<LoopMessage>,
}

impl BackgroundHandle {
    /// Queue a host event.
    pub async fn dispatch(&self, event: HostEvent) -> TubefilterResult<()> {
        self.tx
            .send(LoopMessage::Event(event))
            .await
            .map_err(|_| TubefilterError::EventLoopClosed)
    }

    /// Ask the loop to stop once in-flight toggles have finished. Events
    /// dispatched after the loop sees the request fail with
    /// [`TubefilterError::EventLoopClosed`].
    pub async fn shutdown(&self) -> TubefilterResult<()> {
        self.tx
            .send(LoopMessage::Shutdown)
            .await
            .map_err(|_| TubefilterError::EventLoopClosed)
    }
}

impl Background {
    pub fn new(router: TabEventRouter, config: BackgroundConfig) -> (Self, BackgroundHandle) {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let background = Self {
            router,
            rx,
            tasks: JoinSet::new(),
            stats: LoopStats::default(),
        };
        (background, BackgroundHandle { tx })
    }

    /// Run until shutdown is requested or every handle is dropped.
    pub async fn run(mut self) -> LoopStats {
        tracing::info!("background event loop started");

        while let Some(msg) = self.rx.recv().await {
            match msg {
                LoopMessage::Event(event) => self.handle_event(event),
                // New dispatches fail from here on. Events already queued are
                // still handled before recv returns None.
                LoopMessage::Shutdown => self.rx.close(),
            }
            self.reap_finished();
        }

        while let Some(result) = self.tasks.join_next().await {
            self.record_toggle(result);
        }

        tracing::info!(stats = ?self.stats, "background event loop stopped");
        self.stats
    }

    fn handle_event(&mut self, event: HostEvent) {
        self.stats.events += 1;

        match event {
            HostEvent::Command { command } => {
                let router = self.router.clone();
                self.tasks.spawn(async move { router.on_command(&command).await });
            }
            HostEvent::Message { message, sender } => {
                if let MessageOutcome::PageActionShown(_) =
                    self.router.on_message(&message, &sender)
                {
                    self.stats.page_actions += 1;
                }
            }
            HostEvent::TabUpdated { tab_id, changes } => {
                if self.router.on_tab_updated(tab_id, &changes).is_some() {
                    self.stats.url_notifications += 1;
                }
            }
        }
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            self.record_toggle(result);
        }
    }

    fn record_toggle(&mut self, result: Result<CommandOutcome, tokio::task::JoinError>) {
        match result {
            Ok(CommandOutcome::Toggled { .. }) => self.stats.toggles += 1,
            Ok(CommandOutcome::Failed { .. }) => self.stats.failed_toggles += 1,
            Ok(CommandOutcome::Ignored) => {}
            Err(e) => {
                self.stats.failed_toggles += 1;
                tracing::error!("command task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BrowserHost, DeliveryStatus, TabChangeInfo, TabId};
    use crate::message::TabMessage;
    use crate::router::CommandRouter;
    use crate::settings::{
        keys, BackendFailure, MemoryBackend, SettingsMap, SettingsRegistry, StorageBackend, Store,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct UrlLog {
        sent: Mutex<Vec<TabId>>,
    }

    impl BrowserHost for UrlLog {
        fn send_tab_message(&self, tab_id: TabId, _message: &TabMessage) -> DeliveryStatus {
            self.sent.lock().unwrap().push(tab_id);
            DeliveryStatus::Attempted
        }

        fn show_page_action(&self, _tab_id: TabId) {}
    }

    fn background() -> (Background, BackgroundHandle, Arc<MemoryBackend>, Arc<UrlLog>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = Store::new(backend.clone(), Arc::new(SettingsRegistry::standard()));
        let host = Arc::new(UrlLog::default());
        let router = TabEventRouter::new(CommandRouter::new(store), host.clone());
        let (background, handle) = Background::new(router, BackgroundConfig::default());
        (background, handle, backend, host)
    }

    #[test]
    fn test_config_defaults() {
        assert_eq!(BackgroundConfig::default().channel_capacity, 64);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_toggles() {
        let (background, handle, backend, _) = background();
        let task = tokio::spawn(background.run());

        handle
            .dispatch(HostEvent::Command {
                command: "toggle-hide-videos-checkbox".to_string(),
            })
            .await
            .unwrap();
        handle
            .dispatch(HostEvent::Command {
                command: "not-ours".to_string(),
            })
            .await
            .unwrap();
        handle.shutdown().await.unwrap();

        let stats = task.await.unwrap();
        assert_eq!(stats.events, 2);
        assert_eq!(stats.toggles, 1);
        assert_eq!(backend.value(keys::HIDE_VIDEOS_CHECKBOX).await, Some(json!(true)));
    }

    #[tokio::test]
    async fn test_url_notifications_forwarded_in_order() {
        let (background, handle, _, host) = background();
        let task = tokio::spawn(background.run());

        for tab_id in [3, 1, 3, 2] {
            handle
                .dispatch(HostEvent::TabUpdated {
                    tab_id,
                    changes: TabChangeInfo::with_url(format!("https://example.com/{tab_id}")),
                })
                .await
                .unwrap();
        }
        handle
            .dispatch(HostEvent::TabUpdated {
                tab_id: 9,
                changes: TabChangeInfo::default(),
            })
            .await
            .unwrap();
        drop(handle);

        let stats = task.await.unwrap();
        assert_eq!(stats.url_notifications, 4);
        assert_eq!(*host.sent.lock().unwrap(), vec![3, 1, 3, 2]);
    }

    /// Backend whose reads wait for `release`.
    struct GatedBackend {
        inner: MemoryBackend,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl StorageBackend for GatedBackend {
        async fn get(&self, keys: &[String]) -> Result<SettingsMap, BackendFailure> {
            self.release.notified().await;
            self.inner.get(keys).await
        }

        async fn set(&self, items: SettingsMap) -> Result<(), BackendFailure> {
            self.inner.set(items).await
        }
    }

    #[tokio::test]
    async fn test_dispatch_while_draining_fails() {
        let release = Arc::new(Notify::new());
        let backend = GatedBackend {
            inner: MemoryBackend::new(),
            release: release.clone(),
        };
        let store = Store::new(Arc::new(backend), Arc::new(SettingsRegistry::standard()));
        let router = TabEventRouter::new(CommandRouter::new(store), Arc::new(UrlLog::default()));
        let (background, handle) = Background::new(router, BackgroundConfig::default());
        let task = tokio::spawn(background.run());

        handle
            .dispatch(HostEvent::Command {
                command: "toggle-hide-videos-checkbox".to_string(),
            })
            .await
            .unwrap();
        handle.shutdown().await.unwrap();
        // Let the loop take both messages and block on the gated toggle.
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert!(!task.is_finished());

        let late = handle
            .dispatch(HostEvent::TabUpdated {
                tab_id: 1,
                changes: TabChangeInfo::with_url("https://example.com/"),
            })
            .await;
        assert!(matches!(late, Err(TubefilterError::EventLoopClosed)));

        release.notify_one();
        let stats = task.await.unwrap();
        assert_eq!(stats.events, 1);
        assert_eq!(stats.toggles, 1);
        assert_eq!(stats.url_notifications, 0);
    }

    #[tokio::test]
    async fn test_events_queued_behind_shutdown_are_handled() {
        let (background, handle, _, host) = background();
        handle.shutdown().await.unwrap();
        handle
            .dispatch(HostEvent::TabUpdated {
                tab_id: 4,
                changes: TabChangeInfo::with_url("https://example.com/"),
            })
            .await
            .unwrap();

        let stats = background.run().await;
        assert_eq!(stats.url_notifications, 1);
        assert_eq!(*host.sent.lock().unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn test_dispatch_after_stop_fails() {
        let (background, handle, _, _) = background();
        handle.shutdown().await.unwrap();
        background.run().await;

        let err = handle
            .dispatch(HostEvent::Command {
                command: "toggle-hide-videos-checkbox".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TubefilterError::EventLoopClosed));
    }
}
