use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::actor::ActorId;

/// One verification item on the technical review checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    pub verified: bool,
}

impl ChecklistItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            verified: false,
        }
    }
}

/// Independent check of the audit file before a certification decision.
///
/// At most one active review exists per audit. A correction transition voids
/// the stale review instead of editing it in place; re-entering technical
/// review attaches a fresh record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalReview {
    pub reviewer: ActorId,
    pub checklist: Vec<ChecklistItem>,
    pub approved: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub voided: bool,
}

impl TechnicalReview {
    pub fn new(reviewer: ActorId, checklist_labels: &[&str]) -> Self {
        Self {
            reviewer,
            checklist: checklist_labels
                .iter()
                .map(|label| ChecklistItem::new(*label))
                .collect(),
            approved: false,
            completed_at: None,
            voided: false,
        }
    }

    pub fn verify_item(&mut self, label: &str) -> bool {
        match self.checklist.iter_mut().find(|item| item.label == label) {
            Some(item) => {
                item.verified = true;
                true
            }
            None => false,
        }
    }

    pub fn first_unverified(&self) -> Option<&str> {
        self.checklist
            .iter()
            .find(|item| !item.verified)
            .map(|item| item.label.as_str())
    }

    pub fn checklist_complete(&self) -> bool {
        self.checklist.iter().all(|item| item.verified)
    }

    pub fn approve(&mut self) {
        self.approved = true;
        self.completed_at = Some(Utc::now());
    }

    pub fn void(&mut self) {
        self.voided = true;
    }
}

/// Outcome of the binding certification decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Granted,
    Denied,
    Conditional,
}

impl std::fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DecisionOutcome::Granted => "granted",
            DecisionOutcome::Denied => "denied",
            DecisionOutcome::Conditional => "conditional",
        };
        f.write_str(label)
    }
}

/// The final, independent determination to grant, deny, or condition
/// certification. Immutable once recorded; corrections void it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationDecision {
    pub decision_maker: ActorId,
    pub outcome: DecisionOutcome,
    pub justification: String,
    pub decided_at: DateTime<Utc>,
    pub voided: bool,
}

impl CertificationDecision {
    pub fn new(
        decision_maker: ActorId,
        outcome: DecisionOutcome,
        justification: impl Into<String>,
    ) -> Self {
        Self {
            decision_maker,
            outcome,
            justification: justification.into(),
            decided_at: Utc::now(),
            voided: false,
        }
    }

    pub fn void(&mut self) {
        self.voided = true;
    }
}
