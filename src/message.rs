//! Messages exchanged between the background coordinator and content scripts.

use serde::{Deserialize, Serialize};

/// Sent to a content script when the URL of its tab changes.
pub const URL_CHANGE_MESSAGE: &str = "url-change";

/// Requests a page filter query. The handler lives in the content script.
pub const PAGE_FILTER_QUERY_MESSAGE: &str = "page-filter-query";

/// Sent by a content script to reveal the toolbar icon for its tab.
pub const SHOW_PAGE_ACTION_MESSAGE: &str = "showPageAction";

/// Known message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "url-change")]
    UrlChange,
    #[serde(rename = "page-filter-query")]
    PageFilterQuery,
    #[serde(rename = "showPageAction")]
    ShowPageAction,
    /// Any type this version does not understand.
    #[default]
    #[serde(other, skip_serializing)]
    Unknown,
}

impl MessageKind {
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            MessageKind::UrlChange => Some(URL_CHANGE_MESSAGE),
            MessageKind::PageFilterQuery => Some(PAGE_FILTER_QUERY_MESSAGE),
            MessageKind::ShowPageAction => Some(SHOW_PAGE_ACTION_MESSAGE),
            MessageKind::Unknown => None,
        }
    }
}

/// Request sent to the background by another extension context.
///
/// Wire form: `{"type": "showPageAction", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeMessage {
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// Remaining fields, kept opaque.
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl RuntimeMessage {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            payload: serde_json::Map::new(),
        }
    }
}

/// Notification pushed from the background into a tab's content script.
///
/// Wire form: `{"message": "url-change"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabMessage {
    pub message: MessageKind,
}

impl TabMessage {
    pub fn url_change() -> Self {
        Self {
            message: MessageKind::UrlChange,
        }
    }
}
