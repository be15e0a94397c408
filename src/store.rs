//! Versioned aggregate store. Every read returns the aggregate with its
//! current version; commits are compare-and-swap on that version, so two
//! concurrent transitions on the same audit can never both apply.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::audit_trail::{AuditTrail, StatusLogEntry};
use crate::domain::{Actor, ActorId, Audit, AuditId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("audit {0} not found")]
    AuditNotFound(AuditId),

    #[error("audit {0} already exists")]
    AuditAlreadyExists(AuditId),

    #[error("actor {0} is not registered")]
    ActorNotFound(ActorId),

    #[error("audit {audit_id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        audit_id: AuditId,
        expected: u64,
        found: u64,
    },

    #[error("actor {actor} is referenced by {entries} status log entries and cannot be removed")]
    ActorReferenced { actor: ActorId, entries: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "database")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "database")]
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Persistence contract for the workflow engine and its CRUD collaborators.
///
/// `commit_transition` is the only way a status change reaches storage: it
/// applies the already-mutated aggregate and appends the log entry as one
/// atomic unit, conditional on the version captured at read time.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Register a new audit in draft.
    async fn create_audit(&self, audit: Audit) -> Result<(), StoreError>;

    async fn load(&self, id: &AuditId) -> Result<Audit, StoreError>;

    /// Compare-and-swap save for record-keeping mutations between
    /// transitions (findings, documentation, review/decision records).
    async fn save(&self, expected_version: u64, audit: Audit) -> Result<Audit, StoreError>;

    /// Atomically apply a transition: status update plus one appended log
    /// row, conditional on `expected_version`. Returns the committed
    /// aggregate with its new version.
    async fn commit_transition(
        &self,
        expected_version: u64,
        audit: Audit,
        entry: StatusLogEntry,
    ) -> Result<Audit, StoreError>;

    /// Log entries for one audit in timestamp order.
    async fn log_entries(&self, id: &AuditId) -> Result<Vec<StatusLogEntry>, StoreError>;

    async fn register_actor(&self, actor: Actor) -> Result<(), StoreError>;

    async fn actor(&self, id: &ActorId) -> Result<Actor, StoreError>;

    /// Remove an actor from the registry. Rejected with
    /// `StoreError::ActorReferenced` while the immutable log references the
    /// identity.
    async fn remove_actor(&self, id: &ActorId) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct StoreState {
    audits: HashMap<AuditId, Audit>,
    trail: AuditTrail,
    actors: HashMap<ActorId, Actor>,
}

/// In-memory store. A single lock over audits, trail and actors makes the
/// commit (status + log row) atomic; different audits still proceed
/// independently because no lock is held across awaits.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    state: RwLock<StoreState>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_version(current: &Audit, expected: u64) -> Result<(), StoreError> {
        if current.version != expected {
            return Err(StoreError::VersionConflict {
                audit_id: current.id,
                expected,
                found: current.version,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn create_audit(&self, audit: Audit) -> Result<(), StoreError> {
        let mut state = self.state.write().expect("store lock poisoned");
        if state.audits.contains_key(&audit.id) {
            return Err(StoreError::AuditAlreadyExists(audit.id));
        }
        state.audits.insert(audit.id, audit);
        Ok(())
    }

    async fn load(&self, id: &AuditId) -> Result<Audit, StoreError> {
        let state = self.state.read().expect("store lock poisoned");
        state
            .audits
            .get(id)
            .cloned()
            .ok_or(StoreError::AuditNotFound(*id))
    }

    async fn save(&self, expected_version: u64, mut audit: Audit) -> Result<Audit, StoreError> {
        let mut state = self.state.write().expect("store lock poisoned");
        let current = state
            .audits
            .get(&audit.id)
            .ok_or(StoreError::AuditNotFound(audit.id))?;
        Self::check_version(current, expected_version)?;
        audit.version = expected_version + 1;
        audit.updated_at = chrono::Utc::now();
        state.audits.insert(audit.id, audit.clone());
        Ok(audit)
    }

    async fn commit_transition(
        &self,
        expected_version: u64,
        mut audit: Audit,
        entry: StatusLogEntry,
    ) -> Result<Audit, StoreError> {
        let mut state = self.state.write().expect("store lock poisoned");
        let current = state
            .audits
            .get(&audit.id)
            .ok_or(StoreError::AuditNotFound(audit.id))?;
        Self::check_version(current, expected_version)?;

        audit.version = expected_version + 1;
        audit.updated_at = entry.changed_at;
        state.audits.insert(audit.id, audit.clone());
        state.trail.append(entry);
        Ok(audit)
    }

    async fn log_entries(&self, id: &AuditId) -> Result<Vec<StatusLogEntry>, StoreError> {
        let state = self.state.read().expect("store lock poisoned");
        Ok(state.trail.entries_for(id))
    }

    async fn register_actor(&self, actor: Actor) -> Result<(), StoreError> {
        let mut state = self.state.write().expect("store lock poisoned");
        state.actors.insert(actor.id.clone(), actor);
        Ok(())
    }

    async fn actor(&self, id: &ActorId) -> Result<Actor, StoreError> {
        let state = self.state.read().expect("store lock poisoned");
        state
            .actors
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ActorNotFound(id.clone()))
    }

    async fn remove_actor(&self, id: &ActorId) -> Result<(), StoreError> {
        let mut state = self.state.write().expect("store lock poisoned");
        let entries = state.trail.references_actor(id);
        if entries > 0 {
            return Err(StoreError::ActorReferenced {
                actor: id.clone(),
                entries,
            });
        }
        state
            .actors
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::ActorNotFound(id.clone()))
    }
}
