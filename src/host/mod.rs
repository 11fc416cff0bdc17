//! Boundary with the browser extension host.
//!
//! The host owns tabs, the toolbar and message delivery. The coordinator only
//! sees the events it emits ([`HostEvent`]) and the two actions it offers
//! ([`BrowserHost`]).

pub mod stdio;

use serde::{Deserialize, Serialize};

use crate::message::{RuntimeMessage, TabMessage};

/// Host-assigned tab identifier.
pub type TabId = i64;

/// Outcome of handing a message to the host for delivery.
///
/// Delivery is fire-and-forget: neither variant is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The host accepted the message for delivery.
    Attempted,
    /// No content script is listening in the target tab.
    NoListener,
}

/// Actions the coordinator can ask the host to perform.
///
/// Both calls must return without waiting on the target context.
pub trait BrowserHost: Send + Sync {
    /// Send `message` to the content script(s) of `tab_id`.
    fn send_tab_message(&self, tab_id: TabId, message: &TabMessage) -> DeliveryStatus;

    /// Show the extension's toolbar icon for `tab_id`.
    fn show_page_action(&self, tab_id: TabId);
}

/// Tab that sent a runtime message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderTab {
    pub id: TabId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Origin of a runtime message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSender {
    /// Absent when the message came from a non-tab context such as the
    /// options page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<SenderTab>,
}

impl MessageSender {
    pub fn from_tab(id: TabId) -> Self {
        Self {
            tab: Some(SenderTab { id, url: None }),
        }
    }

    pub fn tab_id(&self) -> Option<TabId> {
        self.tab.as_ref().map(|tab| tab.id)
    }
}

/// Properties of a tab that changed in an update event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabChangeInfo {
    /// New URL, present only when the URL changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Loading status ("loading" / "complete").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TabChangeInfo {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// Events the host delivers to the background coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum HostEvent {
    /// A global keyboard shortcut fired.
    Command { command: String },
    /// Another extension context sent a runtime message.
    Message {
        message: RuntimeMessage,
        #[serde(default)]
        sender: MessageSender,
    },
    /// A tab's state changed.
    TabUpdated { tab_id: TabId, changes: TabChangeInfo },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use serde_json::json;

    #[test]
    fn test_parse_command_event() {
        let event: HostEvent = serde_json::from_value(json!({
            "event": "command",
            "command": "toggle-hide-videos-checkbox",
        }))
        .unwrap();

        assert_eq!(
            event,
            HostEvent::Command {
                command: "toggle-hide-videos-checkbox".to_string()
            }
        );
    }

    #[test]
    fn test_parse_message_event() {
        let event: HostEvent = serde_json::from_value(json!({
            "event": "message",
            "message": {"type": "showPageAction"},
            "sender": {"tab": {"id": 7, "url": "https://www.youtube.com/"}},
        }))
        .unwrap();

        match event {
            HostEvent::Message { message, sender } => {
                assert_eq!(message.kind, MessageKind::ShowPageAction);
                assert_eq!(sender.tab_id(), Some(7));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_parse_tab_updated_without_url() {
        let event: HostEvent = serde_json::from_value(json!({
            "event": "tab-updated",
            "tab_id": 3,
            "changes": {"status": "loading"},
        }))
        .unwrap();

        match event {
            HostEvent::TabUpdated { tab_id, changes } => {
                assert_eq!(tab_id, 3);
                assert!(changes.url.is_none());
                assert_eq!(changes.status.as_deref(), Some("loading"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
