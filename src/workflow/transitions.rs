//! The transition table. Forward path: draft -> in_review -> submitted_to_cb
//! -> technical_review -> decision_pending -> closed. Corrective path: from
//! submitted_to_cb or technical_review to returned_for_correction, whose only
//! onward transition is back to in_review. Closed is terminal.

use crate::domain::AuditStatus;

pub fn allowed_targets(from: AuditStatus) -> &'static [AuditStatus] {
    match from {
        AuditStatus::Draft => &[AuditStatus::InReview],
        AuditStatus::InReview => &[AuditStatus::SubmittedToCb],
        AuditStatus::SubmittedToCb => &[
            AuditStatus::TechnicalReview,
            AuditStatus::ReturnedForCorrection,
        ],
        AuditStatus::ReturnedForCorrection => &[AuditStatus::InReview],
        AuditStatus::TechnicalReview => &[
            AuditStatus::DecisionPending,
            AuditStatus::ReturnedForCorrection,
        ],
        AuditStatus::DecisionPending => &[AuditStatus::Closed],
        AuditStatus::Closed => &[],
    }
}

pub fn is_allowed(from: AuditStatus, to: AuditStatus) -> bool {
    allowed_targets(from).contains(&to)
}

/// Corrective transitions re-open the audit file and require a
/// justification.
pub fn is_corrective(to: AuditStatus) -> bool {
    to == AuditStatus::ReturnedForCorrection
}
