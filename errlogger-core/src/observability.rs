//! Logging setup and spans for delivery

use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Default directive when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "errlogger_core=info,errlogger=info";

/// Initialize tracing with environment-based configuration
///
/// Returns quietly if a global subscriber is already installed.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let _ = Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

/// Create a span for one delivery attempt
#[inline]
pub fn delivery_span(index: u64, attempt: u32) -> Span {
    tracing::debug_span!(
        "delivery",
        index = index,
        attempt = attempt,
        outcome = tracing::field::Empty,
    )
}
