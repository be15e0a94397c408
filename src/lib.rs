// Certflow - certification audit lifecycle engine
// This exposes the workflow engine, compliance calculators and stores for
// the surrounding record-keeping and delivery layers.

pub mod audit_trail;
pub mod compliance;
pub mod config;
pub mod database;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod store;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use audit_trail::{replay_status_history, AuditTrail, StatusLogEntry};
pub use compliance::{
    DurationAssessment, DurationInputs, DurationRules, DurationSeverity, DurationValidator,
    ProcessComplexity, RegulatoryEnvironment, SamplingInputs, SamplingPlan, SamplingPlanner,
    SamplingRules, ScopeVariation,
};
pub use config::{config, init_config, CertflowConfig};
pub use domain::{
    Actor, ActorId, Audit, AuditId, AuditStatus, AuditTeam, CertificationDecision,
    DecisionOutcome, Finding, FindingKind, MultiSitePlan, Severity, StaffRole, TeamRole,
    TechnicalReview, VerificationStatus,
};
pub use events::{DomainEvent, EventBus};
pub use metrics::{WorkflowMetrics, WorkflowStats};
pub use store::{AuditStore, InMemoryAuditStore, StoreError};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use workflow::{
    IndependenceRole, PermissionDenied, PermissionOracle, ValidationFailure, WorkflowEngine,
    WorkflowError,
};

#[cfg(feature = "database")]
pub use database::SqliteAuditStore;
