//! Typed domain events. The engine publishes one event per committed
//! transition on a broadcast channel; notification and documentation
//! collaborators subscribe by receiver. Delivery is at-least-once (a
//! lagging receiver observes the lag and must resync from the status log),
//! so consumers are expected to be idempotent on
//! `(audit_id, to_status, changed_at)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::{ActorId, AuditId, AuditStatus, DecisionOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    AuditStatusChanged {
        audit_id: AuditId,
        from_status: AuditStatus,
        to_status: AuditStatus,
        actor: ActorId,
        changed_at: DateTime<Utc>,
    },
    TechnicalReviewCompleted {
        audit_id: AuditId,
        reviewer: ActorId,
        approved: bool,
    },
    CertificationDecisionMade {
        audit_id: AuditId,
        decision_maker: ActorId,
        outcome: DecisionOutcome,
    },
}

impl DomainEvent {
    pub fn audit_id(&self) -> &AuditId {
        match self {
            DomainEvent::AuditStatusChanged { audit_id, .. }
            | DomainEvent::TechnicalReviewCompleted { audit_id, .. }
            | DomainEvent::CertificationDecisionMade { audit_id, .. } => audit_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers. Returns the number of
    /// receivers the event reached; zero when nobody is subscribed, which is
    /// not an error.
    pub fn publish(&self, event: DomainEvent) -> usize {
        let audit_id = *event.audit_id();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(audit_id = %audit_id, receivers, "domain event published");
                receivers
            }
            Err(_) => {
                debug!(audit_id = %audit_id, "domain event published with no subscribers");
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
