//! Deterministic compliance calculators consumed as gates by the workflow
//! engine: multi-site sampling (IAF MD1) and audit duration (IAF MD5).

pub mod duration;
pub mod sampling;

pub use duration::{
    DurationAssessment, DurationBand, DurationInputs, DurationRules, DurationSeverity,
    DurationValidator, ProcessComplexity, RegulatoryEnvironment,
};
pub use sampling::{
    SamplingBreakdown, SamplingInputs, SamplingPlan, SamplingPlanner, SamplingRules, ScopeVariation,
    SelectionCheck,
};
