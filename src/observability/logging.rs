//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Log check transitions through a [`StatusListener`]

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::health::{State, StatusListener};

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("healthwatch={},healthd={}", default_level, default_level).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Listener that reports transitions as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

impl StatusListener for LogListener {
    fn check_failed(&self, state: &State) {
        tracing::warn!(
            check = %state.name,
            error = state.error.as_deref().unwrap_or_default(),
            "Check is now failing"
        );
    }

    fn check_recovered(&self, state: &State, recorded_failures: u64, failure_duration_secs: f64) {
        tracing::info!(
            check = %state.name,
            failures = recorded_failures,
            failure_duration_secs,
            "Check recovered"
        );
    }

    fn still_failing(&self, state: &State, recorded_failures: u64) {
        tracing::warn!(
            check = %state.name,
            failures = recorded_failures + 1,
            error = state.error.as_deref().unwrap_or_default(),
            "Check still failing"
        );
    }
}
