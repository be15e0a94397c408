use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compliance::SamplingInputs;

use super::actor::ActorId;
use super::finding::{Finding, FindingUpdateError, VerificationStatus};
use super::review::{CertificationDecision, TechnicalReview};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuditId(pub Uuid);

impl AuditId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The seven lifecycle states of a certification audit. Status only changes
/// through the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Draft,
    InReview,
    SubmittedToCb,
    ReturnedForCorrection,
    TechnicalReview,
    DecisionPending,
    Closed,
}

impl AuditStatus {
    pub const ALL: [AuditStatus; 7] = [
        AuditStatus::Draft,
        AuditStatus::InReview,
        AuditStatus::SubmittedToCb,
        AuditStatus::ReturnedForCorrection,
        AuditStatus::TechnicalReview,
        AuditStatus::DecisionPending,
        AuditStatus::Closed,
    ];

    pub fn is_terminal(self) -> bool {
        self == AuditStatus::Closed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Draft => "draft",
            AuditStatus::InReview => "in_review",
            AuditStatus::SubmittedToCb => "submitted_to_cb",
            AuditStatus::ReturnedForCorrection => "returned_for_correction",
            AuditStatus::TechnicalReview => "technical_review",
            AuditStatus::DecisionPending => "decision_pending",
            AuditStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        AuditStatus::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    LeadAuditor,
    Auditor,
    TechnicalExpert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub actor: ActorId,
    pub role: TeamRole,
}

/// The assigned audit team: exactly one lead auditor plus members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTeam {
    pub members: Vec<TeamMember>,
}

impl AuditTeam {
    pub fn new(lead: ActorId) -> Self {
        Self {
            members: vec![TeamMember {
                actor: lead,
                role: TeamRole::LeadAuditor,
            }],
        }
    }

    pub fn with_member(mut self, actor: ActorId, role: TeamRole) -> Self {
        self.members.push(TeamMember { actor, role });
        self
    }

    pub fn lead_auditor(&self) -> Option<&ActorId> {
        self.members
            .iter()
            .find(|m| m.role == TeamRole::LeadAuditor)
            .map(|m| &m.actor)
    }

    pub fn contains(&self, actor: &ActorId) -> bool {
        self.members.iter().any(|m| &m.actor == actor)
    }
}

/// A required section of the audit documentation package. All sections must
/// be complete before the file can be submitted to the certification body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationSection {
    pub name: String,
    pub complete: bool,
}

/// Recorded multi-site sampling parameters plus the number of sites the team
/// actually visited. Absent for single-site audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSitePlan {
    pub inputs: SamplingInputs,
    pub sites_visited: u32,
}

/// Aggregate root for one certification audit. The aggregate is the unit of
/// mutual exclusion: every committed change bumps `version`, and commits are
/// rejected when the stored version no longer matches the one read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub id: AuditId,
    pub organization: String,
    pub standard: String,
    pub team: AuditTeam,
    pub status: AuditStatus,
    pub documentation: Vec<DocumentationSection>,
    pub multi_site: Option<MultiSitePlan>,
    pub findings: Vec<Finding>,
    pub technical_review: Option<TechnicalReview>,
    pub decision: Option<CertificationDecision>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl Audit {
    pub fn new(
        organization: impl Into<String>,
        standard: impl Into<String>,
        team: AuditTeam,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AuditId::new(),
            organization: organization.into(),
            standard: standard.into(),
            team,
            status: AuditStatus::Draft,
            documentation: Vec::new(),
            multi_site: None,
            findings: Vec::new(),
            technical_review: None,
            decision: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn with_documentation(mut self, sections: &[&str]) -> Self {
        self.documentation = sections
            .iter()
            .map(|name| DocumentationSection {
                name: name.to_string(),
                complete: false,
            })
            .collect();
        self
    }

    pub fn with_multi_site(mut self, plan: MultiSitePlan) -> Self {
        self.multi_site = Some(plan);
        self
    }

    pub fn documentation_complete(&self) -> bool {
        self.documentation.iter().all(|s| s.complete)
    }

    pub fn first_incomplete_section(&self) -> Option<&str> {
        self.documentation
            .iter()
            .find(|s| !s.complete)
            .map(|s| s.name.as_str())
    }

    pub fn mark_section_complete(&mut self, name: &str) -> bool {
        match self.documentation.iter_mut().find(|s| s.name == name) {
            Some(section) => {
                section.complete = true;
                true
            }
            None => false,
        }
    }

    /// First major nonconformity whose verification is not yet accepted or
    /// closed, if any. Such a finding blocks escalation to technical review.
    pub fn first_blocking_nonconformity(&self) -> Option<&Finding> {
        self.findings.iter().find(|f| f.blocks_escalation())
    }

    pub fn record_finding(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn next_finding_id(&self) -> u32 {
        self.findings.iter().map(|f| f.id).max().unwrap_or(0) + 1
    }

    pub fn advance_finding_verification(
        &mut self,
        finding_id: u32,
        next: VerificationStatus,
    ) -> Result<(), FindingUpdateError> {
        match self.findings.iter_mut().find(|f| f.id == finding_id) {
            Some(finding) => finding.advance_verification(next),
            None => Err(FindingUpdateError::NotANonconformity { id: finding_id }),
        }
    }

    /// The technical review that currently counts, ignoring voided records.
    pub fn active_review(&self) -> Option<&TechnicalReview> {
        self.technical_review.as_ref().filter(|r| !r.voided)
    }

    /// The certification decision that currently counts, ignoring voided
    /// records.
    pub fn active_decision(&self) -> Option<&CertificationDecision> {
        self.decision.as_ref().filter(|d| !d.voided)
    }

    pub fn attach_review(&mut self, review: TechnicalReview) {
        self.technical_review = Some(review);
    }

    pub fn attach_decision(&mut self, decision: CertificationDecision) {
        self.decision = Some(decision);
    }

    /// A correction re-opens the audit file: any review or decision recorded
    /// against the stale file is voided, never edited in place.
    pub fn void_review_and_decision(&mut self) {
        if let Some(review) = &mut self.technical_review {
            review.void();
        }
        if let Some(decision) = &mut self.decision {
            decision.void();
        }
    }
}
