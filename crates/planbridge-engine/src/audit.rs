//! Calendar lifecycle audit records
//!
//! An [`AuditEntry`] is a write-once record of one lifecycle action; once
//! handed to a sink it is never mutated. Storage of the entries is a
//! collaborator's concern; [`InMemoryAuditSink`] is the append-only default
//! used by the bridge and its tests.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Lifecycle action covered by the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Removed,
    Restored,
    Repaired,
    Changed,
    DuplicateDetected,
}

/// Immutable record of one lifecycle action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub entity: String,
    pub action: AuditAction,
    pub old_value: String,
    pub new_value: String,
}

impl AuditEntry {
    /// Build an entry stamped with the current time.
    #[must_use]
    pub fn now(
        entity: impl Into<String>,
        action: AuditAction,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            entity: entity.into(),
            action,
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

/// Receiver of audit entries.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Append-only in-memory sink.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    inner: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries, in append order.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.inner.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, entry: AuditEntry) {
        self.inner.lock().push(entry);
    }
}
