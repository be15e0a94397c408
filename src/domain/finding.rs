use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Major,
    Minor,
}

/// Evidence-response lifecycle of a nonconformity. The progression is
/// forward-only: open -> client_responded -> accepted -> closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Open,
    ClientResponded,
    Accepted,
    Closed,
}

impl VerificationStatus {
    /// A resolved nonconformity no longer blocks escalation to technical review.
    pub fn is_resolved(self) -> bool {
        matches!(self, VerificationStatus::Accepted | VerificationStatus::Closed)
    }

    fn rank(self) -> u8 {
        match self {
            VerificationStatus::Open => 0,
            VerificationStatus::ClientResponded => 1,
            VerificationStatus::Accepted => 2,
            VerificationStatus::Closed => 3,
        }
    }

    pub fn can_advance_to(self, next: VerificationStatus) -> bool {
        next.rank() == self.rank() + 1
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VerificationStatus::Open => "open",
            VerificationStatus::ClientResponded => "client_responded",
            VerificationStatus::Accepted => "accepted",
            VerificationStatus::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Discriminant payload of a finding. One record type carries all three
/// finding kinds; only nonconformities track severity and verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    Nonconformity {
        severity: Severity,
        verification: VerificationStatus,
    },
    Observation,
    OpportunityForImprovement,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FindingUpdateError {
    #[error("finding {id} is not a nonconformity and has no verification status")]
    NotANonconformity { id: u32 },
    #[error("verification cannot move from {from} to {to}")]
    IllegalVerificationStep {
        from: VerificationStatus,
        to: VerificationStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Sequence number within the owning audit.
    pub id: u32,
    /// Clause of the audited standard the finding is raised against.
    pub clause: String,
    pub description: String,
    pub kind: FindingKind,
    pub recorded_at: DateTime<Utc>,
}

impl Finding {
    pub fn nonconformity(
        id: u32,
        clause: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id,
            clause: clause.into(),
            description: description.into(),
            kind: FindingKind::Nonconformity {
                severity,
                verification: VerificationStatus::Open,
            },
            recorded_at: Utc::now(),
        }
    }

    pub fn observation(id: u32, clause: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            clause: clause.into(),
            description: description.into(),
            kind: FindingKind::Observation,
            recorded_at: Utc::now(),
        }
    }

    pub fn opportunity(id: u32, clause: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            clause: clause.into(),
            description: description.into(),
            kind: FindingKind::OpportunityForImprovement,
            recorded_at: Utc::now(),
        }
    }

    pub fn is_major_nonconformity(&self) -> bool {
        matches!(
            self.kind,
            FindingKind::Nonconformity {
                severity: Severity::Major,
                ..
            }
        )
    }

    /// A major nonconformity whose verification is still open or awaiting
    /// review blocks the submitted_to_cb -> technical_review gate.
    pub fn blocks_escalation(&self) -> bool {
        match self.kind {
            FindingKind::Nonconformity {
                severity: Severity::Major,
                verification,
            } => !verification.is_resolved(),
            _ => false,
        }
    }

    pub fn verification(&self) -> Option<VerificationStatus> {
        match self.kind {
            FindingKind::Nonconformity { verification, .. } => Some(verification),
            _ => None,
        }
    }

    pub fn advance_verification(
        &mut self,
        next: VerificationStatus,
    ) -> Result<(), FindingUpdateError> {
        match &mut self.kind {
            FindingKind::Nonconformity { verification, .. } => {
                if !verification.can_advance_to(next) {
                    return Err(FindingUpdateError::IllegalVerificationStep {
                        from: *verification,
                        to: next,
                    });
                }
                *verification = next;
                Ok(())
            }
            _ => Err(FindingUpdateError::NotANonconformity { id: self.id }),
        }
    }
}
