//! The workflow engine: loads the aggregate, consults the permission oracle,
//! runs the transition-specific guards, and commits the new status together
//! with a status log entry in one atomic unit. On any failure the audit and
//! the log are untouched.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::audit_trail::StatusLogEntry;
use crate::compliance::SamplingPlanner;
use crate::domain::{Actor, ActorId, Audit, AuditId, AuditStatus, VerificationStatus};
use crate::events::{DomainEvent, EventBus};
use crate::metrics::WorkflowMetrics;
use crate::store::{AuditStore, StoreError};

use super::permissions::{IndependenceRole, PermissionOracle};
use super::transitions;

/// A named guard condition that is not met. Recoverable: the caller fixes
/// the underlying record and resubmits.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("documentation section '{section}' is not complete")]
    DocumentationIncomplete { section: String },

    #[error("major nonconformity against clause {clause} has verification status {status}")]
    UnresolvedMajorNonconformity {
        clause: String,
        status: VerificationStatus,
    },

    #[error("{visited} sites visited, {required} required by the sampling plan")]
    SamplingShortfall { required: u32, visited: u32 },

    #[error("a justification is required for corrective transitions")]
    MissingJustification,

    #[error("no active technical review is recorded")]
    MissingTechnicalReview,

    #[error("technical review checklist item '{item}' is not verified")]
    ChecklistItemUnverified { item: String },

    #[error("technical review is not approved")]
    ReviewNotApproved,

    #[error("no active certification decision is recorded")]
    MissingDecision,

    #[error("certification decision has no justification")]
    DecisionJustificationMissing,
}

/// The actor lacks a capability or fails an independence rule. Not
/// retryable without a different actor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionDenied {
    #[error("actor {actor} may not perform {from} -> {to}")]
    NotAuthorized {
        actor: ActorId,
        from: AuditStatus,
        to: AuditStatus,
    },

    #[error("reviewer {candidate} is a member of the audit team")]
    ReviewerNotIndependent { candidate: ActorId },

    #[error("decision maker {candidate} participated in the audit or its review")]
    DecisionMakerNotIndependent { candidate: ActorId },
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("permission denied: {0}")]
    Permission(#[from] PermissionDenied),

    #[error("no transition from {from} to {to}")]
    InvalidTransition { from: AuditStatus, to: AuditStatus },

    #[error("audit {audit_id} was modified concurrently; reload and retry")]
    ConcurrencyConflict { audit_id: AuditId },

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { audit_id, .. } => {
                WorkflowError::ConcurrencyConflict { audit_id }
            }
            StoreError::ActorReferenced { .. } => WorkflowError::Integrity(err.to_string()),
            other => WorkflowError::Store(other),
        }
    }
}

pub struct WorkflowEngine {
    store: Arc<dyn AuditStore>,
    oracle: PermissionOracle,
    planner: SamplingPlanner,
    events: EventBus,
    metrics: Arc<WorkflowMetrics>,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn AuditStore>, planner: SamplingPlanner) -> Self {
        Self {
            store,
            oracle: PermissionOracle::new(),
            planner,
            events: EventBus::default(),
            metrics: Arc::new(WorkflowMetrics::default()),
        }
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    pub fn metrics(&self) -> &WorkflowMetrics {
        &self.metrics
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    /// Attempt a transition. On success the status update, the appended log
    /// row and the emitted events form one atomic unit; on failure nothing
    /// changes and the typed error names the unmet condition.
    pub async fn transition(
        &self,
        audit_id: &AuditId,
        actor_id: &ActorId,
        target: AuditStatus,
        justification: Option<&str>,
    ) -> Result<AuditStatus, WorkflowError> {
        let actor = self.store.actor(actor_id).await?;
        let audit = self.store.load(audit_id).await?;
        let from = audit.status;

        if let Err(err) = self.evaluate(&actor, &audit, target, justification) {
            self.metrics.record_rejection(&err);
            warn!(
                audit_id = %audit_id,
                actor = %actor_id,
                from = %from,
                to = %target,
                error = %err,
                "transition rejected"
            );
            return Err(err);
        }

        let changed_at = Utc::now();
        let mut updated = audit.clone();
        updated.status = target;
        if transitions::is_corrective(target) {
            updated.void_review_and_decision();
        }

        let entry = StatusLogEntry {
            audit_id: *audit_id,
            from_status: from,
            to_status: target,
            actor: actor_id.clone(),
            changed_at,
            justification: justification
                .map(str::trim)
                .filter(|j| !j.is_empty())
                .map(String::from),
        };

        let committed = self
            .store
            .commit_transition(audit.version, updated, entry)
            .await
            .map_err(|err| {
                let err = WorkflowError::from(err);
                self.metrics.record_rejection(&err);
                err
            })?;

        self.metrics.record_commit();
        info!(
            audit_id = %audit_id,
            actor = %actor_id,
            from = %from,
            to = %target,
            version = committed.version,
            "audit status transition committed"
        );

        self.events.publish(DomainEvent::AuditStatusChanged {
            audit_id: *audit_id,
            from_status: from,
            to_status: target,
            actor: actor_id.clone(),
            changed_at,
        });
        if from == AuditStatus::TechnicalReview && target == AuditStatus::DecisionPending {
            if let Some(review) = committed.active_review() {
                self.events.publish(DomainEvent::TechnicalReviewCompleted {
                    audit_id: *audit_id,
                    reviewer: review.reviewer.clone(),
                    approved: review.approved,
                });
            }
        }
        if target == AuditStatus::Closed {
            if let Some(decision) = committed.active_decision() {
                self.events.publish(DomainEvent::CertificationDecisionMade {
                    audit_id: *audit_id,
                    decision_maker: decision.decision_maker.clone(),
                    outcome: decision.outcome,
                });
            }
        }

        Ok(committed.status)
    }

    /// The set of targets the actor could legally transition this audit to
    /// right now. Re-evaluates the same capability and guard checks as
    /// `transition` without mutating anything; the justification requirement
    /// is a request-payload constraint and is not part of availability.
    pub async fn available_transitions(
        &self,
        audit_id: &AuditId,
        actor_id: &ActorId,
    ) -> Result<BTreeSet<AuditStatus>, WorkflowError> {
        let actor = self.store.actor(actor_id).await?;
        let audit = self.store.load(audit_id).await?;

        Ok(transitions::allowed_targets(audit.status)
            .iter()
            .copied()
            .filter(|target| {
                self.oracle
                    .can_transition(&actor, &audit, audit.status, *target)
                    && self.check_guards(&audit, *target).is_ok()
            })
            .collect())
    }

    fn evaluate(
        &self,
        actor: &Actor,
        audit: &Audit,
        target: AuditStatus,
        justification: Option<&str>,
    ) -> Result<(), WorkflowError> {
        let from = audit.status;

        if !transitions::is_allowed(from, target) {
            return Err(WorkflowError::InvalidTransition { from, to: target });
        }

        if !self.oracle.can_transition(actor, audit, from, target) {
            return Err(PermissionDenied::NotAuthorized {
                actor: actor.id.clone(),
                from,
                to: target,
            }
            .into());
        }

        if transitions::is_corrective(target)
            && justification.map(str::trim).unwrap_or("").is_empty()
        {
            return Err(ValidationFailure::MissingJustification.into());
        }

        self.check_guards(audit, target)
    }

    /// Transition-specific guards, keyed on the (from, to) edge. Capability
    /// is already checked; these validate the state of the audit file
    /// itself.
    fn check_guards(&self, audit: &Audit, target: AuditStatus) -> Result<(), WorkflowError> {
        use AuditStatus::*;
        match (audit.status, target) {
            (InReview, SubmittedToCb) => {
                if let Some(section) = audit.first_incomplete_section() {
                    return Err(ValidationFailure::DocumentationIncomplete {
                        section: section.to_string(),
                    }
                    .into());
                }
                Ok(())
            }
            (SubmittedToCb, TechnicalReview) => {
                if let Some(finding) = audit.first_blocking_nonconformity() {
                    return Err(ValidationFailure::UnresolvedMajorNonconformity {
                        clause: finding.clause.clone(),
                        status: finding
                            .verification()
                            .unwrap_or(VerificationStatus::Open),
                    }
                    .into());
                }
                if let Some(plan) = &audit.multi_site {
                    let required = self.planner.calculate(&plan.inputs).minimum_sites;
                    let check = self
                        .planner
                        .validate_selection(plan.sites_visited, required);
                    if !check.ok {
                        return Err(ValidationFailure::SamplingShortfall {
                            required,
                            visited: plan.sites_visited,
                        }
                        .into());
                    }
                }
                Ok(())
            }
            (TechnicalReview, DecisionPending) => {
                let review = audit
                    .active_review()
                    .ok_or(ValidationFailure::MissingTechnicalReview)?;
                if let Some(item) = review.first_unverified() {
                    return Err(ValidationFailure::ChecklistItemUnverified {
                        item: item.to_string(),
                    }
                    .into());
                }
                if !review.approved {
                    return Err(ValidationFailure::ReviewNotApproved.into());
                }
                if !self.oracle.check_independence(
                    &review.reviewer,
                    audit,
                    IndependenceRole::TechnicalReviewer,
                ) {
                    return Err(PermissionDenied::ReviewerNotIndependent {
                        candidate: review.reviewer.clone(),
                    }
                    .into());
                }
                Ok(())
            }
            (DecisionPending, Closed) => {
                let decision = audit
                    .active_decision()
                    .ok_or(ValidationFailure::MissingDecision)?;
                if decision.justification.trim().is_empty() {
                    return Err(ValidationFailure::DecisionJustificationMissing.into());
                }
                if !self.oracle.check_independence(
                    &decision.decision_maker,
                    audit,
                    IndependenceRole::DecisionMaker,
                ) {
                    return Err(PermissionDenied::DecisionMakerNotIndependent {
                        candidate: decision.decision_maker.clone(),
                    }
                    .into());
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
