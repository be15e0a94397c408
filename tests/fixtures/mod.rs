//! Shared fixtures for the workflow integration tests: a staffed store, a
//! draft audit, and helpers that perform the record-keeping mutations the
//! external CRUD collaborator would do between transitions.
#![allow(dead_code)]

use std::sync::Arc;

use certflow::compliance::SamplingPlanner;
use certflow::domain::{
    Actor, ActorId, Audit, AuditId, AuditStatus, AuditTeam, CertificationDecision,
    DecisionOutcome, StaffRole, TeamRole, TechnicalReview,
};
use certflow::store::{AuditStore, InMemoryAuditStore};
use certflow::workflow::WorkflowEngine;

pub const ADMIN: &str = "admin-01";
pub const LEAD: &str = "lead-01";
pub const MEMBER: &str = "aud-02";
pub const REVIEWER: &str = "rev-01";
pub const DECIDER: &str = "dec-01";
pub const OUTSIDER: &str = "out-01";

pub const DOC_SECTIONS: [&str; 2] = ["audit_plan", "audit_report"];
pub const CHECKLIST: [&str; 2] = ["audit file complete", "findings dispositioned"];

pub fn staff() -> Vec<Actor> {
    vec![
        Actor::new(ADMIN, "Ada", StaffRole::Administrator),
        Actor::new(LEAD, "Lena", StaffRole::Auditor),
        Actor::new(MEMBER, "Ben", StaffRole::Auditor),
        Actor::new(REVIEWER, "Rita", StaffRole::TechnicalReviewer),
        Actor::new(DECIDER, "Dana", StaffRole::DecisionMaker),
        Actor::new(OUTSIDER, "Oskar", StaffRole::Auditor),
    ]
}

pub fn actor_id(id: &str) -> ActorId {
    ActorId::new(id)
}

pub fn draft_audit() -> Audit {
    Audit::new(
        "Acme Widgets",
        "ISO 9001:2015",
        AuditTeam::new(ActorId::new(LEAD)).with_member(ActorId::new(MEMBER), TeamRole::Auditor),
    )
    .with_documentation(&DOC_SECTIONS)
}

/// Engine over an in-memory store seeded with the staff roster and one
/// draft audit.
pub async fn setup() -> (WorkflowEngine, AuditId) {
    setup_with_audit(draft_audit()).await
}

pub async fn setup_with_audit(audit: Audit) -> (WorkflowEngine, AuditId) {
    let store = Arc::new(InMemoryAuditStore::new());
    for actor in staff() {
        store.register_actor(actor).await.unwrap();
    }
    let id = audit.id;
    store.create_audit(audit).await.unwrap();
    let engine = WorkflowEngine::new(store, SamplingPlanner::default());
    (engine, id)
}

/// Apply a record-keeping mutation to the aggregate the way the CRUD
/// collaborator would: load, mutate, compare-and-swap save.
pub async fn mutate_audit<F>(engine: &WorkflowEngine, id: &AuditId, mutate: F)
where
    F: FnOnce(&mut Audit),
{
    let store = engine.store();
    let mut audit = store.load(id).await.unwrap();
    let version = audit.version;
    mutate(&mut audit);
    store.save(version, audit).await.unwrap();
}

pub async fn complete_documentation(engine: &WorkflowEngine, id: &AuditId) {
    mutate_audit(engine, id, |audit| {
        for section in DOC_SECTIONS {
            audit.mark_section_complete(section);
        }
    })
    .await;
}

pub async fn attach_completed_review(engine: &WorkflowEngine, id: &AuditId, reviewer: &str) {
    let reviewer = ActorId::new(reviewer);
    mutate_audit(engine, id, move |audit| {
        let mut review = TechnicalReview::new(reviewer, &CHECKLIST);
        for item in CHECKLIST {
            review.verify_item(item);
        }
        review.approve();
        audit.attach_review(review);
    })
    .await;
}

pub async fn attach_decision(engine: &WorkflowEngine, id: &AuditId, maker: &str) {
    let maker = ActorId::new(maker);
    mutate_audit(engine, id, move |audit| {
        audit.attach_decision(CertificationDecision::new(
            maker,
            DecisionOutcome::Granted,
            "All certification requirements demonstrated",
        ));
    })
    .await;
}

/// Drive the audit along the forward path to `target`, performing the
/// record-keeping each gate requires.
pub async fn advance_to(engine: &WorkflowEngine, id: &AuditId, target: AuditStatus) {
    loop {
        let status = engine.store().load(id).await.unwrap().status;
        if status == target {
            return;
        }
        match status {
            AuditStatus::Draft => {
                engine
                    .transition(id, &actor_id(LEAD), AuditStatus::InReview, None)
                    .await
                    .unwrap();
            }
            AuditStatus::InReview => {
                complete_documentation(engine, id).await;
                engine
                    .transition(id, &actor_id(LEAD), AuditStatus::SubmittedToCb, None)
                    .await
                    .unwrap();
            }
            AuditStatus::SubmittedToCb => {
                engine
                    .transition(id, &actor_id(ADMIN), AuditStatus::TechnicalReview, None)
                    .await
                    .unwrap();
            }
            AuditStatus::TechnicalReview => {
                attach_completed_review(engine, id, REVIEWER).await;
                engine
                    .transition(id, &actor_id(ADMIN), AuditStatus::DecisionPending, None)
                    .await
                    .unwrap();
            }
            AuditStatus::DecisionPending => {
                attach_decision(engine, id, DECIDER).await;
                engine
                    .transition(id, &actor_id(ADMIN), AuditStatus::Closed, None)
                    .await
                    .unwrap();
            }
            other => panic!("cannot advance from {other} toward {target}"),
        }
    }
}
