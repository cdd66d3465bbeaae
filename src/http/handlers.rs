use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::health::{Scheduler, State as CheckState, Status};

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: Status,
    pub checks: BTreeMap<String, CheckState>,
}

impl HealthReport {
    pub fn from_states(states: impl IntoIterator<Item = (String, CheckState)>) -> Self {
        let checks: BTreeMap<String, CheckState> = states.into_iter().collect();
        let status = if checks.values().any(CheckState::is_failure) {
            Status::Failed
        } else {
            Status::Ok
        };
        Self { status, checks }
    }
}

/// Every recorded check. 503 when any of them is failing.
pub async fn get_health(State(scheduler): State<Arc<Scheduler>>) -> Response {
    let report = HealthReport::from_states(scheduler.states());
    let code = match report.status {
        Status::Ok => StatusCode::OK,
        Status::Failed => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(report)).into_response()
}

/// One check's latest state, or 404 if it has none.
pub async fn get_check(
    State(scheduler): State<Arc<Scheduler>>,
    Path(name): Path<String>,
) -> Response {
    match scheduler.state(&name) {
        Some(state) => Json(state).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("no state for check '{}'", name) })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state(name: &str, status: Status) -> CheckState {
        let failed = status == Status::Failed;
        let now = Utc::now();
        CheckState {
            name: name.to_string(),
            status,
            error: failed.then(|| "boom".to_string()),
            details: None,
            check_time: now,
            contiguous_failures: u64::from(failed),
            first_failure_at: failed.then_some(now),
        }
    }

    #[test]
    fn test_empty_report_is_ok() {
        let report = HealthReport::from_states(Vec::new());
        assert_eq!(report.status, Status::Ok);
        assert!(report.checks.is_empty());
    }

    #[test]
    fn test_any_failure_fails_report() {
        let report = HealthReport::from_states(vec![
            ("a".to_string(), state("a", Status::Ok)),
            ("b".to_string(), state("b", Status::Failed)),
        ]);
        assert_eq!(report.status, Status::Failed);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["checks"]["b"]["num_failures"], 1);
    }
}
