use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging. Logs go to stderr so stdout stays free for
/// the wizard's own output. `RUST_LOG` wins over the configured level.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry().with(fmt_layer).with(filter).try_init()?;

    tracing::info!("KYC wizard telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for one wizard session
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span carrying the attributes shared by every event of a session
pub fn create_wizard_span(session_id: &str, variant: &str, transaction_id: &str) -> tracing::Span {
    tracing::info_span!(
        "wizard_session",
        session.id = session_id,
        wizard.variant = variant,
        transaction.id = transaction_id,
        otel.kind = "internal"
    )
}

/// Create a span for one tracking timeline run
pub fn create_tracking_span(transaction_id: &str) -> tracing::Span {
    tracing::info_span!("transaction_tracking", transaction.id = transaction_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_are_unique_uuids() {
        let first = generate_correlation_id();
        let second = generate_correlation_id();
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
