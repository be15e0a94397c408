//! The audit-lifecycle state machine: transition table, capability and
//! separation-of-duties oracle, and the engine that commits transitions
//! atomically.

pub mod engine;
pub mod permissions;
pub mod transitions;

pub use engine::{PermissionDenied, ValidationFailure, WorkflowEngine, WorkflowError};
pub use permissions::{IndependenceRole, PermissionOracle};
pub use transitions::{allowed_targets, is_allowed, is_corrective};
