//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_check_runs_total` (counter): probe runs by check, status
//! - `health_check_duration_seconds` (histogram): probe latency by check
//! - `health_check_up` (gauge): 1=ok, 0=failed, as of the last run
//! - `health_check_running` (gauge): 1 while the check has a lane
//! - `health_check_transitions_total` (counter): transitions by check, kind
//! - `health_check_notifications_dropped_total` (counter): by check
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::Status;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_check_run(check: &str, status: Status, elapsed: Duration) {
    let check = check.to_string();
    metrics::counter!(
        "health_check_runs_total",
        "check" => check.clone(),
        "status" => status.as_str()
    )
    .increment(1);
    metrics::histogram!("health_check_duration_seconds", "check" => check.clone())
        .record(elapsed.as_secs_f64());
    let up = if status == Status::Ok { 1.0 } else { 0.0 };
    metrics::gauge!("health_check_up", "check" => check).set(up);
}

pub fn record_transition(check: &str, kind: &'static str) {
    metrics::counter!(
        "health_check_transitions_total",
        "check" => check.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_dropped_notification(check: &str) {
    metrics::counter!(
        "health_check_notifications_dropped_total",
        "check" => check.to_string()
    )
    .increment(1);
}

pub fn record_started(check: &str) {
    metrics::gauge!("health_check_running", "check" => check.to_string()).set(1.0);
}

/// Mark a check as no longer running. Its up gauge keeps the last result.
pub fn record_stopped(check: &str) {
    metrics::gauge!("health_check_running", "check" => check.to_string()).set(0.0);
}
