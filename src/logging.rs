//! Logging Setup and Run Correlation
//!
//! Library code logs through the `log` macros. The binary installs a
//! `tracing` subscriber that also receives those records, so every line
//! emitted inside a run's span carries its `trace_id` field.

use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Name of the span a dispatched run executes in.
pub const RUN_SPAN: &str = "execute_workflow";

/// Span attributing everything logged during one run to `trace_id`.
pub fn run_span(trace_id: &str) -> Span {
    tracing::info_span!("execute_workflow", trace_id = %trace_id)
}

/// Installs the fmt subscriber and bridges `log` records into it.
///
/// `RUST_LOG` overrides the default level.
pub fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
