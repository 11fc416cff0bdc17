//! Record of store failures.
//!
//! Failed reads and writes never reach the caller's continuation, so the
//! diagnostic log is the only trace they leave besides the tracing output.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::error::StoreOperation;

/// A single failed store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub operation: StoreOperation,
    pub keys: Vec<String>,
    /// Message produced by the backend, unchanged.
    pub message: String,
}

/// Number of diagnostics kept by [`DiagnosticLog::new`].
pub const DEFAULT_DIAGNOSTIC_CAPACITY: usize = 256;

/// Shared list of the most recent diagnostics. Once full, recording a new
/// entry evicts the oldest one.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    entries: Arc<Mutex<VecDeque<Diagnostic>>>,
    capacity: usize,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_DIAGNOSTIC_CAPACITY)
    }
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&self, diagnostic: Diagnostic) {
        tracing::error!(
            operation = %diagnostic.operation,
            keys = ?diagnostic.keys,
            "Store.{}(): failed to {} items: {}",
            diagnostic.operation,
            diagnostic.operation,
            diagnostic.message
        );

        // A poisoned lock only means another recorder panicked mid-push.
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(diagnostic);
    }

    /// Snapshot of the retained entries, oldest first.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let log = DiagnosticLog::new();
        let other = log.clone();

        other.record(Diagnostic {
            operation: StoreOperation::Set,
            keys: vec!["k".to_string()],
            message: "quota".to_string(),
        });

        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].message, "quota");
    }

    #[test]
    fn test_oldest_entries_are_evicted_at_capacity() {
        let log = DiagnosticLog::with_capacity(3);

        for i in 0..10 {
            log.record(Diagnostic {
                operation: StoreOperation::Get,
                keys: vec![format!("k{i}")],
                message: format!("failure {i}"),
            });
        }

        let messages: Vec<String> = log.entries().into_iter().map(|d| d.message).collect();
        assert_eq!(messages, vec!["failure 7", "failure 8", "failure 9"]);
    }

    #[test]
    fn test_zero_capacity_keeps_latest_entry() {
        let log = DiagnosticLog::with_capacity(0);
        assert_eq!(log.capacity(), 1);
        assert_eq!(DiagnosticLog::new().capacity(), DEFAULT_DIAGNOSTIC_CAPACITY);
    }
}
