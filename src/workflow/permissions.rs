//! Capability and separation-of-duties checks. Every transition attempt
//! consults this oracle exactly once; no permission logic is duplicated in
//! callers. All predicates are pure functions over already-loaded aggregate
//! data.

use crate::domain::{Actor, ActorId, Audit, AuditStatus, StaffRole};

/// Which independence rule to evaluate for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndependenceRole {
    /// Must not be part of the audit team.
    TechnicalReviewer,
    /// Must not be part of the audit team nor the technical reviewer.
    DecisionMaker,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionOracle;

impl PermissionOracle {
    pub fn new() -> Self {
        Self
    }

    /// May `actor` request the `from -> to` transition on `audit`?
    ///
    /// This covers capability only; guard conditions (documentation,
    /// findings, review content) are evaluated separately by the engine.
    pub fn can_transition(
        &self,
        actor: &Actor,
        audit: &Audit,
        from: AuditStatus,
        to: AuditStatus,
    ) -> bool {
        use AuditStatus::*;
        match (from, to) {
            (Draft, InReview) => self.is_lead_or_admin(actor, audit),
            (InReview, SubmittedToCb) => self.is_lead_or_admin(actor, audit),
            (SubmittedToCb, TechnicalReview) => actor.is_administrator(),
            (SubmittedToCb, ReturnedForCorrection) | (TechnicalReview, ReturnedForCorrection) => {
                actor.is_administrator() || actor.is_technical_reviewer()
            }
            (TechnicalReview, DecisionPending) => {
                actor.is_administrator() || actor.is_technical_reviewer()
            }
            (DecisionPending, Closed) => {
                actor.is_administrator() || self.is_recorded_decision_maker(actor, audit)
            }
            (ReturnedForCorrection, InReview) => self.is_lead_or_admin(actor, audit),
            _ => false,
        }
    }

    /// Separation-of-duties predicate: the people who audit, review and
    /// decide must be distinct individuals.
    pub fn check_independence(
        &self,
        candidate: &ActorId,
        audit: &Audit,
        role: IndependenceRole,
    ) -> bool {
        match role {
            IndependenceRole::TechnicalReviewer => !audit.team.contains(candidate),
            IndependenceRole::DecisionMaker => {
                !audit.team.contains(candidate)
                    && audit
                        .active_review()
                        .is_none_or(|review| &review.reviewer != candidate)
            }
        }
    }

    fn is_lead_or_admin(&self, actor: &Actor, audit: &Audit) -> bool {
        actor.is_administrator() || audit.team.lead_auditor() == Some(&actor.id)
    }

    fn is_recorded_decision_maker(&self, actor: &Actor, audit: &Audit) -> bool {
        actor.role == StaffRole::DecisionMaker
            && audit
                .active_decision()
                .is_some_and(|decision| decision.decision_maker == actor.id)
    }
}
