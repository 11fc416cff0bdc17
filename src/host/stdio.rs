//! Newline-delimited JSON bridge to a host shim.
//!
//! Each inbound line is one [`HostEvent`]; each outbound line is one
//! [`HostAction`]. Stdout carries nothing else, so logging goes to stderr.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use super::{BrowserHost, DeliveryStatus, HostEvent, TabId};
use crate::message::TabMessage;

/// Request sent from the coordinator to the host shim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum HostAction {
    SendTabMessage { tab_id: TabId, message: TabMessage },
    ShowPageAction { tab_id: TabId },
}

/// [`BrowserHost`] that forwards actions to an output channel.
///
/// The shim cannot report whether a content script listened, so every
/// send is [`DeliveryStatus::Attempted`] unless the output is gone.
#[derive(Debug, Clone)]
pub struct StdioHost {
    tx: mpsc::UnboundedSender<HostAction>,
}

impl StdioHost {
    /// Create the host and the receiving half for [`write_actions`].
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostAction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, action: HostAction) -> bool {
        self.tx.send(action).is_ok()
    }
}

impl BrowserHost for StdioHost {
    fn send_tab_message(&self, tab_id: TabId, message: &TabMessage) -> DeliveryStatus {
        if self.emit(HostAction::SendTabMessage {
            tab_id,
            message: *message,
        }) {
            DeliveryStatus::Attempted
        } else {
            DeliveryStatus::NoListener
        }
    }

    fn show_page_action(&self, tab_id: TabId) {
        if !self.emit(HostAction::ShowPageAction { tab_id }) {
            tracing::debug!(tab_id, "host output closed, page action dropped");
        }
    }
}

/// Parse one inbound line. Blank lines and malformed events yield `None`.
pub fn decode_event(line: &str) -> Option<HostEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!("ignoring malformed host event: {}", e);
            None
        }
    }
}

/// Read events from `reader` until EOF or until `on_event` returns `false`.
///
/// Lines that are not valid UTF-8 are skipped like any other malformed event.
pub async fn read_events<R, F, Fut>(mut reader: R, mut on_event: F) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(HostEvent) -> Fut,
    Fut: Future<Output = bool>,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("ignoring host event that is not UTF-8: {}", e);
                continue;
            }
        };
        if let Some(event) = decode_event(line) {
            if !on_event(event).await {
                break;
            }
        }
    }
    Ok(())
}

/// Write every action from `rx` to `writer`, one JSON object per line.
pub async fn write_actions<W>(
    mut rx: mpsc::UnboundedReceiver<HostAction>,
    mut writer: W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(action) = rx.recv().await {
        let mut line = serde_json::to_vec(&action)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}
