//! Routing of host events.
//!
//! Three independent, stateless handlers:
//! 1. Keyboard shortcuts toggle settings through the [`CommandRouter`].
//! 2. `showPageAction` requests reveal the toolbar icon for the sending tab.
//! 3. Tab URL changes are forwarded to that tab's content script.

use std::sync::Arc;

use crate::host::{BrowserHost, DeliveryStatus, MessageSender, TabChangeInfo, TabId};
use crate::message::{MessageKind, RuntimeMessage, TabMessage};

use super::command::{CommandOutcome, CommandRouter};

/// What the message handler did with a runtime message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    PageActionShown(TabId),
    Ignored,
}

/// Dispatches host events to their handlers.
#[derive(Clone)]
pub struct TabEventRouter {
    commands: CommandRouter,
    host: Arc<dyn BrowserHost>,
}

impl std::fmt::Debug for TabEventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabEventRouter")
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

impl TabEventRouter {
    pub fn new(commands: CommandRouter, host: Arc<dyn BrowserHost>) -> Self {
        Self { commands, host }
    }

    pub fn commands(&self) -> &CommandRouter {
        &self.commands
    }

    /// Keyboard shortcut handler.
    pub async fn on_command(&self, command: &str) -> CommandOutcome {
        self.commands.dispatch(command).await
    }

    /// Runtime message handler.
    pub fn on_message(&self, message: &RuntimeMessage, sender: &MessageSender) -> MessageOutcome {
        match (message.kind, sender.tab_id()) {
            (MessageKind::ShowPageAction, Some(tab_id)) => {
                self.host.show_page_action(tab_id);
                MessageOutcome::PageActionShown(tab_id)
            }
            (MessageKind::ShowPageAction, None) => {
                tracing::debug!("showPageAction without a sender tab");
                MessageOutcome::Ignored
            }
            (kind, _) => {
                tracing::trace!(?kind, "ignoring runtime message");
                MessageOutcome::Ignored
            }
        }
    }

    /// Tab update handler. Returns `None` when the update carried no URL or
    /// an empty one.
    ///
    /// Each URL change produces exactly one notification, sent immediately, so
    /// notifications for a tab keep the order of its updates.
    pub fn on_tab_updated(&self, tab_id: TabId, changes: &TabChangeInfo) -> Option<DeliveryStatus> {
        if changes.url.as_deref().map_or(true, str::is_empty) {
            return None;
        }

        let status = self.host.send_tab_message(tab_id, &TabMessage::url_change());
        if status == DeliveryStatus::NoListener {
            tracing::trace!(tab_id, "no content script listening for url-change");
        }
        Some(status)
    }
}
