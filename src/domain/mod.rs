//! Domain model: the audit aggregate and its value types. All status
//! mutation goes through the workflow engine; the types here only expose the
//! record-keeping the external CRUD collaborator performs between
//! transitions.

pub mod actor;
pub mod audit;
pub mod finding;
pub mod review;

pub use actor::{Actor, ActorId, StaffRole};
pub use audit::{
    Audit, AuditId, AuditStatus, AuditTeam, DocumentationSection, MultiSitePlan, TeamMember,
    TeamRole,
};
pub use finding::{Finding, FindingKind, FindingUpdateError, Severity, VerificationStatus};
pub use review::{CertificationDecision, ChecklistItem, DecisionOutcome, TechnicalReview};
