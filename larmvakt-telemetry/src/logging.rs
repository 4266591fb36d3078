//! ## larmvakt-telemetry::logging
//! **Structured logging for the orchestrator**
//!
//! Every supervised child additionally gets its own durable log file under
//! the run's log directory; this module only covers the orchestrator's own
//! stream. Operators diagnose per-unit failures from the per-unit files,
//! not from here.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    pub fn init() {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::ENTER)
            .init()
    }

    /// Emit a structured orchestration event (process launched, lifecycle
    /// transition, export finished) with key/value metadata.
    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "orchestration_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );

        async {
            tracing::info!(
                metadata = ?metadata,
                "Orchestration event occurred"
            );
        }
        .instrument(span)
        .await
    }
}
