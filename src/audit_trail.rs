//! Append-only transition log. One entry per committed transition, never
//! updated or deleted; actor identities referenced here cannot be removed
//! from the registry while entries exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ActorId, AuditId, AuditStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLogEntry {
    pub audit_id: AuditId,
    pub from_status: AuditStatus,
    pub to_status: AuditStatus,
    pub actor: ActorId,
    pub changed_at: DateTime<Utc>,
    pub justification: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct AuditTrail {
    entries: Vec<StatusLogEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: StatusLogEntry) {
        self.entries.push(entry);
    }

    /// Entries for one audit in timestamp order. Entries are appended in
    /// commit order, so the sort is a no-op in practice; it is kept so the
    /// contract holds even for entries restored from external storage.
    pub fn entries_for(&self, audit_id: &AuditId) -> Vec<StatusLogEntry> {
        let mut entries: Vec<StatusLogEntry> = self
            .entries
            .iter()
            .filter(|e| &e.audit_id == audit_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.changed_at);
        entries
    }

    pub fn references_actor(&self, actor: &ActorId) -> usize {
        self.entries.iter().filter(|e| &e.actor == actor).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reconstruct the exact sequence of states an audit passed through from its
/// log entries. The first element is the state before the first transition.
/// Returns `None` when the entries do not chain (a gap or duplicate), which
/// would indicate log corruption.
pub fn replay_status_history(entries: &[StatusLogEntry]) -> Option<Vec<AuditStatus>> {
    let first = match entries.first() {
        Some(entry) => entry,
        None => return Some(Vec::new()),
    };

    let mut history = vec![first.from_status];
    let mut last = first.from_status;
    for entry in entries {
        if entry.from_status != last {
            return None;
        }
        history.push(entry.to_status);
        last = entry.to_status;
    }
    Some(history)
}
