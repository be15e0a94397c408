use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Initialize structured JSON logging. Correlation ids on transition spans
/// let the certification body tie a committed transition back to the request
/// that caused it long after the fact.
pub fn init_telemetry() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("certflow telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking related operations.
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span carrying the common attributes of one transition attempt.
pub fn create_transition_span(
    audit_id: &str,
    actor_id: &str,
    target_status: &str,
    correlation_id: Option<&str>,
) -> tracing::Span {
    tracing::info_span!(
        "audit_transition",
        audit.id = audit_id,
        actor.id = actor_id,
        target.status = target_status,
        correlation.id = correlation_id,
    )
}

/// Shutdown telemetry gracefully.
pub fn shutdown_telemetry() {
    tracing::info!("certflow telemetry shutdown complete");
}
