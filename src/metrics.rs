//! Transition counters. Cheap atomics, safe to share across the engine and
//! any reporting task.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::workflow::WorkflowError;

#[derive(Debug, Default)]
pub struct WorkflowMetrics {
    pub committed_transitions: AtomicU64,
    pub validation_rejections: AtomicU64,
    pub permission_rejections: AtomicU64,
    pub invalid_transition_rejections: AtomicU64,
    pub concurrency_conflicts: AtomicU64,
    pub integrity_rejections: AtomicU64,
    pub store_failures: AtomicU64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_commit(&self) {
        self.committed_transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, error: &WorkflowError) {
        let counter = match error {
            WorkflowError::Validation(_) => &self.validation_rejections,
            WorkflowError::Permission(_) => &self.permission_rejections,
            WorkflowError::InvalidTransition { .. } => &self.invalid_transition_rejections,
            WorkflowError::ConcurrencyConflict { .. } => &self.concurrency_conflicts,
            WorkflowError::Integrity(_) => &self.integrity_rejections,
            WorkflowError::Store(_) => &self.store_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkflowStats {
        WorkflowStats {
            committed_transitions: self.committed_transitions.load(Ordering::Relaxed),
            validation_rejections: self.validation_rejections.load(Ordering::Relaxed),
            permission_rejections: self.permission_rejections.load(Ordering::Relaxed),
            invalid_transition_rejections: self
                .invalid_transition_rejections
                .load(Ordering::Relaxed),
            concurrency_conflicts: self.concurrency_conflicts.load(Ordering::Relaxed),
            integrity_rejections: self.integrity_rejections.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.snapshot();
        info!(
            "workflow metrics: committed={}, validation={}, permission={}, invalid={}, conflicts={}, integrity={}, store={}",
            stats.committed_transitions,
            stats.validation_rejections,
            stats.permission_rejections,
            stats.invalid_transition_rejections,
            stats.concurrency_conflicts,
            stats.integrity_rejections,
            stats.store_failures,
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowStats {
    pub committed_transitions: u64,
    pub validation_rejections: u64,
    pub permission_rejections: u64,
    pub invalid_transition_rejections: u64,
    pub concurrency_conflicts: u64,
    pub integrity_rejections: u64,
    pub store_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuditId, AuditStatus};

    #[test]
    fn test_rejections_are_bucketed_by_kind() {
        let metrics = WorkflowMetrics::new();
        metrics.record_commit();
        metrics.record_rejection(&WorkflowError::InvalidTransition {
            from: AuditStatus::Closed,
            to: AuditStatus::Draft,
        });
        metrics.record_rejection(&WorkflowError::ConcurrencyConflict {
            audit_id: AuditId::new(),
        });

        let stats = metrics.snapshot();
        assert_eq!(stats.committed_transitions, 1);
        assert_eq!(stats.invalid_transition_rejections, 1);
        assert_eq!(stats.concurrency_conflicts, 1);
        assert_eq!(stats.validation_rejections, 0);
    }
}
