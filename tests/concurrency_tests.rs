//! Optimistic-concurrency behavior: two writers racing on the same audit
//! from the same source state can never both commit.

mod fixtures;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use certflow::audit_trail::StatusLogEntry;
use certflow::compliance::SamplingPlanner;
use certflow::domain::{Actor, ActorId, Audit, AuditId, AuditStatus};
use certflow::store::{AuditStore, InMemoryAuditStore, StoreError};
use certflow::workflow::{WorkflowEngine, WorkflowError};
use fixtures::*;

/// Store wrapper that lets a rival writer commit between another caller's
/// read and commit, which is the window optimistic concurrency protects.
struct ContendedStore {
    inner: InMemoryAuditStore,
    raced: AtomicBool,
}

impl ContendedStore {
    fn new(inner: InMemoryAuditStore) -> Self {
        Self {
            inner,
            raced: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AuditStore for ContendedStore {
    async fn create_audit(&self, audit: Audit) -> Result<(), StoreError> {
        self.inner.create_audit(audit).await
    }

    async fn load(&self, id: &AuditId) -> Result<Audit, StoreError> {
        let audit = self.inner.load(id).await?;
        // First read in draft: a rival submits the same transition before
        // the caller reaches its commit.
        if audit.status == AuditStatus::Draft && !self.raced.swap(true, Ordering::SeqCst) {
            let mut rival = audit.clone();
            rival.status = AuditStatus::InReview;
            let entry = StatusLogEntry {
                audit_id: audit.id,
                from_status: AuditStatus::Draft,
                to_status: AuditStatus::InReview,
                actor: ActorId::new(ADMIN),
                changed_at: chrono::Utc::now(),
                justification: None,
            };
            self.inner
                .commit_transition(audit.version, rival, entry)
                .await?;
        }
        Ok(audit)
    }

    async fn save(&self, expected_version: u64, audit: Audit) -> Result<Audit, StoreError> {
        self.inner.save(expected_version, audit).await
    }

    async fn commit_transition(
        &self,
        expected_version: u64,
        audit: Audit,
        entry: StatusLogEntry,
    ) -> Result<Audit, StoreError> {
        self.inner
            .commit_transition(expected_version, audit, entry)
            .await
    }

    async fn log_entries(&self, id: &AuditId) -> Result<Vec<StatusLogEntry>, StoreError> {
        self.inner.log_entries(id).await
    }

    async fn register_actor(&self, actor: Actor) -> Result<(), StoreError> {
        self.inner.register_actor(actor).await
    }

    async fn actor(&self, id: &ActorId) -> Result<Actor, StoreError> {
        self.inner.actor(id).await
    }

    async fn remove_actor(&self, id: &ActorId) -> Result<(), StoreError> {
        self.inner.remove_actor(id).await
    }
}

#[tokio::test]
async fn test_stale_commit_yields_concurrency_conflict() {
    let inner = InMemoryAuditStore::new();
    for actor in staff() {
        inner.register_actor(actor).await.unwrap();
    }
    let audit = draft_audit();
    let id = audit.id;
    inner.create_audit(audit).await.unwrap();

    let store = Arc::new(ContendedStore::new(inner));
    let engine = WorkflowEngine::new(store, SamplingPlanner::default());

    // The rival lands first; this caller's commit is based on a stale read.
    let err = engine
        .transition(&id, &actor_id(LEAD), AuditStatus::InReview, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::ConcurrencyConflict { .. }));

    // Exactly one transition committed.
    let stored = engine.store().load(&id).await.unwrap();
    assert_eq!(stored.status, AuditStatus::InReview);
    assert_eq!(stored.version, 1);
    assert_eq!(engine.store().log_entries(&id).await.unwrap().len(), 1);

    // Replaying after reload fails on its own merits: the transition the
    // caller wanted has already happened.
    let err = engine
        .transition(&id, &actor_id(LEAD), AuditStatus::InReview, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_racing_transitions_exactly_one_winner() {
    let (engine, id) = setup().await;
    let engine = Arc::new(engine);

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let id = id;
            tokio::spawn(async move {
                engine
                    .transition(&id, &actor_id(LEAD), AuditStatus::InReview, None)
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(status) => {
                assert_eq!(status, AuditStatus::InReview);
                successes += 1;
            }
            Err(WorkflowError::ConcurrencyConflict { .. })
            | Err(WorkflowError::InvalidTransition { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(successes, 1);

    let stored = engine.store().load(&id).await.unwrap();
    assert_eq!(stored.status, AuditStatus::InReview);
    assert_eq!(stored.version, 1);
    assert_eq!(engine.store().log_entries(&id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_independent_audits_do_not_contend() {
    let store = Arc::new(InMemoryAuditStore::new());
    for actor in staff() {
        store.register_actor(actor).await.unwrap();
    }
    let mut ids = Vec::new();
    for _ in 0..8 {
        let audit = draft_audit();
        ids.push(audit.id);
        store.create_audit(audit).await.unwrap();
    }
    let engine = Arc::new(WorkflowEngine::new(store, SamplingPlanner::default()));

    let tasks: Vec<_> = ids
        .iter()
        .map(|id| {
            let engine = Arc::clone(&engine);
            let id = *id;
            tokio::spawn(async move {
                engine
                    .transition(&id, &actor_id(LEAD), AuditStatus::InReview, None)
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }
    for id in &ids {
        assert_eq!(
            engine.store().load(id).await.unwrap().status,
            AuditStatus::InReview
        );
    }
}
