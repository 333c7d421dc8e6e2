//! Bounded in-memory diagnostics buffer.
//!
//! Holds the most recent webhook-relay events for inspection from the
//! backoffice. Capacity is fixed at construction; the oldest entry is
//! evicted first. Purely diagnostic — nothing reads this for correctness.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugLogEntry {
    pub at: String,
    pub context: String,
    pub message: String,
}

pub struct DebugLogBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<DebugLogEntry>>,
}

impl DebugLogBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn push(&self, context: &str, message: impl Into<String>) {
        let entry = DebugLogEntry {
            at: chrono::Utc::now().to_rfc3339(),
            context: context.to_string(),
            message: message.into(),
        };

        let Ok(mut entries) = self.entries.lock() else {
            // A poisoned diagnostics buffer is not worth propagating
            return;
        };

        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot in insertion order, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DebugLogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }
}
