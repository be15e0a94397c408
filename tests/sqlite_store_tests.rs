#![cfg(feature = "database")]
//! SQLite store integration: aggregate round trip, CAS commit, and the
//! append-only log, against a scratch database file.

mod fixtures;

use certflow::domain::AuditStatus;
use certflow::store::{AuditStore, StoreError};
use certflow::SqliteAuditStore;
use fixtures::*;
use tempfile::TempDir;

async fn scratch_store() -> (SqliteAuditStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let url = format!(
        "sqlite://{}",
        dir.path().join("certflow-test.db").to_string_lossy()
    );
    let store = SqliteAuditStore::new(&url, true).await.unwrap();
    (store, dir)
}

#[tokio::test]
async fn test_aggregate_round_trip() {
    let (store, _dir) = scratch_store().await;
    for actor in staff() {
        store.register_actor(actor).await.unwrap();
    }

    let audit = draft_audit();
    let id = audit.id;
    store.create_audit(audit.clone()).await.unwrap();

    let loaded = store.load(&id).await.unwrap();
    assert_eq!(loaded.status, AuditStatus::Draft);
    assert_eq!(loaded.organization, audit.organization);
    assert_eq!(loaded.version, 0);

    let err = store.create_audit(audit).await.unwrap_err();
    assert!(matches!(err, StoreError::AuditAlreadyExists(_)));
}

#[tokio::test]
async fn test_commit_is_cas_guarded() {
    let (store, _dir) = scratch_store().await;
    let audit = draft_audit();
    let id = audit.id;
    store.create_audit(audit.clone()).await.unwrap();

    let mut first = audit.clone();
    first.status = AuditStatus::InReview;
    let entry = certflow::StatusLogEntry {
        audit_id: id,
        from_status: AuditStatus::Draft,
        to_status: AuditStatus::InReview,
        actor: actor_id(ADMIN),
        changed_at: chrono::Utc::now(),
        justification: None,
    };
    store
        .commit_transition(0, first, entry.clone())
        .await
        .unwrap();

    // A writer still holding version 0 is rejected and appends nothing.
    let mut stale = audit.clone();
    stale.status = AuditStatus::InReview;
    let err = store.commit_transition(0, stale, entry).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::VersionConflict {
            expected: 0,
            found: 1,
            ..
        }
    ));
    assert_eq!(store.log_entries(&id).await.unwrap().len(), 1);
    assert_eq!(store.load(&id).await.unwrap().version, 1);
}

#[tokio::test]
async fn test_log_survives_and_replays() {
    let (store, _dir) = scratch_store().await;
    let audit = draft_audit();
    let id = audit.id;
    store.create_audit(audit.clone()).await.unwrap();

    let steps = [
        (AuditStatus::Draft, AuditStatus::InReview),
        (AuditStatus::InReview, AuditStatus::SubmittedToCb),
    ];
    let mut version = 0;
    for (from, to) in steps {
        let mut next = store.load(&id).await.unwrap();
        next.status = to;
        store
            .commit_transition(
                version,
                next,
                certflow::StatusLogEntry {
                    audit_id: id,
                    from_status: from,
                    to_status: to,
                    actor: actor_id(ADMIN),
                    changed_at: chrono::Utc::now(),
                    justification: None,
                },
            )
            .await
            .unwrap();
        version += 1;
    }

    let entries = store.log_entries(&id).await.unwrap();
    let history = certflow::replay_status_history(&entries).unwrap();
    assert_eq!(
        history,
        vec![
            AuditStatus::Draft,
            AuditStatus::InReview,
            AuditStatus::SubmittedToCb,
        ]
    );
}

#[tokio::test]
async fn test_referenced_actor_is_protected() {
    let (store, _dir) = scratch_store().await;
    for actor in staff() {
        store.register_actor(actor).await.unwrap();
    }
    let audit = draft_audit();
    let id = audit.id;
    store.create_audit(audit.clone()).await.unwrap();

    let mut next = audit.clone();
    next.status = AuditStatus::InReview;
    store
        .commit_transition(
            0,
            next,
            certflow::StatusLogEntry {
                audit_id: id,
                from_status: AuditStatus::Draft,
                to_status: AuditStatus::InReview,
                actor: actor_id(LEAD),
                changed_at: chrono::Utc::now(),
                justification: None,
            },
        )
        .await
        .unwrap();

    let err = store.remove_actor(&actor_id(LEAD)).await.unwrap_err();
    assert!(matches!(err, StoreError::ActorReferenced { entries: 1, .. }));
    store.remove_actor(&actor_id(OUTSIDER)).await.unwrap();
}
