//! Transition detection.
//!
//! # Decision table
//! ```text
//! observation  previous     result
//! failed       not failing  Failed        (streak = 1, first failure = now)
//! failed       failing      StillFailing  (streak + 1, first failure carried)
//! ok           failing      Recovered     (streak reset, duration reported)
//! ok           not failing  none
//! ```
//!
//! A missing previous state counts as not failing.

use chrono::{DateTime, Utc};

use crate::health::state::{Observation, State, Status};

/// Change in failing/healthy classification between two observations.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The check started failing.
    Failed { state: State },
    /// The check failed again; `recorded_failures` is the streak length
    /// before this failure.
    StillFailing { state: State, recorded_failures: u64 },
    /// The check passed after failing `recorded_failures` times in a row.
    Recovered {
        state: State,
        recorded_failures: u64,
        failure_duration_secs: f64,
    },
}

impl Transition {
    pub fn state(&self) -> &State {
        match self {
            Transition::Failed { state }
            | Transition::StillFailing { state, .. }
            | Transition::Recovered { state, .. } => state,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Transition::Failed { .. } => "failed",
            Transition::StillFailing { .. } => "still_failing",
            Transition::Recovered { .. } => "recovered",
        }
    }
}

/// Fold `observation` into `previous`, returning the replacement state and
/// the transition it caused, if any.
pub fn detect(previous: Option<&State>, observation: Observation) -> (State, Option<Transition>) {
    let Observation {
        name,
        check_time,
        outcome,
    } = observation;

    let failing = previous.filter(|p| p.is_failure());
    let prev_failures = failing.map(|p| p.contiguous_failures).unwrap_or(0);
    let prev_first_failure = failing.and_then(|p| p.first_failure_at);

    match outcome {
        Err(err) => {
            let state = State {
                name,
                status: Status::Failed,
                error: Some(err.to_string()),
                details: None,
                check_time,
                contiguous_failures: prev_failures + 1,
                first_failure_at: Some(prev_first_failure.unwrap_or(check_time)),
            };

            let transition = if failing.is_some() {
                Transition::StillFailing {
                    state: state.clone(),
                    recorded_failures: prev_failures,
                }
            } else {
                Transition::Failed {
                    state: state.clone(),
                }
            };
            (state, Some(transition))
        }
        Ok(details) => {
            let state = State {
                name,
                status: Status::Ok,
                error: None,
                details,
                check_time,
                contiguous_failures: 0,
                first_failure_at: None,
            };

            let transition = failing.map(|_| Transition::Recovered {
                state: state.clone(),
                recorded_failures: prev_failures,
                failure_duration_secs: prev_first_failure
                    .map(|first| seconds_between(first, check_time))
                    .unwrap_or(0.0),
            });
            (state, transition)
        }
    }
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).to_std().unwrap_or_default().as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + millis).unwrap()
    }

    fn ok(millis: i64) -> Observation {
        Observation::new("db", at(millis), Ok(None))
    }

    fn failed(millis: i64) -> Observation {
        Observation::new("db", at(millis), Err("timeout".into()))
    }

    /// Feed a sequence of observations, returning every emitted transition.
    fn run(observations: Vec<Observation>) -> (Option<State>, Vec<Transition>) {
        let mut current: Option<State> = None;
        let mut transitions = Vec::new();
        for observation in observations {
            let (state, transition) = detect(current.as_ref(), observation);
            transitions.extend(transition);
            current = Some(state);
        }
        (current, transitions)
    }

    #[test]
    fn test_first_observation_ok_emits_nothing() {
        let (state, transition) = detect(None, ok(0));
        assert_eq!(state.status, Status::Ok);
        assert_eq!(state.contiguous_failures, 0);
        assert!(state.first_failure_at.is_none());
        assert!(transition.is_none());
    }

    #[test]
    fn test_first_observation_failed_starts_streak() {
        let (state, transition) = detect(None, failed(0));
        assert_eq!(state.contiguous_failures, 1);
        assert_eq!(state.first_failure_at, Some(at(0)));
        assert_eq!(state.error.as_deref(), Some("timeout"));
        assert!(matches!(transition, Some(Transition::Failed { .. })));
    }

    #[test]
    fn test_still_failing_reports_pre_increment_count() {
        let (state, transitions) = run(vec![ok(0), failed(100), failed(200), failed(300), failed(400)]);
        let state = state.unwrap();

        assert_eq!(state.contiguous_failures, 4);
        assert_eq!(state.first_failure_at, Some(at(100)));

        let counts: Vec<u64> = transitions
            .iter()
            .filter_map(|t| match t {
                Transition::StillFailing { recorded_failures, .. } => Some(*recorded_failures),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![1, 2, 3]);
        assert_eq!(transitions.iter().filter(|t| t.kind() == "failed").count(), 1);
    }

    #[test]
    fn test_recovery_reports_streak_and_duration() {
        let (state, transitions) = run(vec![ok(0), failed(100), failed(200), failed(300), failed(400), ok(500)]);
        let state = state.unwrap();

        assert_eq!(state.status, Status::Ok);
        assert_eq!(state.contiguous_failures, 0);
        assert!(state.first_failure_at.is_none());

        match transitions.last().unwrap() {
            Transition::Recovered {
                recorded_failures,
                failure_duration_secs,
                ..
            } => {
                assert_eq!(*recorded_failures, 4);
                assert!((failure_duration_secs - 0.4).abs() < 1e-9);
            }
            other => panic!("expected recovery, got {:?}", other),
        }
        assert_eq!(transitions.len(), 5);
    }

    #[test]
    fn test_new_streak_after_recovery_resets_first_failure() {
        let (state, transitions) = run(vec![failed(0), ok(100), failed(200)]);
        let state = state.unwrap();
        assert_eq!(state.contiguous_failures, 1);
        assert_eq!(state.first_failure_at, Some(at(200)));
        let kinds: Vec<&str> = transitions.iter().map(Transition::kind).collect();
        assert_eq!(kinds, vec!["failed", "recovered", "failed"]);
    }

    #[test]
    fn test_ok_payload_kept_and_error_cleared() {
        let previous = detect(None, failed(0)).0;
        let (state, _) = detect(
            Some(&previous),
            Observation::new("db", at(10), Ok(Some(serde_json::json!(42)))),
        );
        assert!(state.error.is_none());
        assert_eq!(state.details, Some(serde_json::json!(42)));
    }

    #[test]
    fn test_failures_zero_iff_ok() {
        let pattern = [true, false, false, true, true, false, true, false, false, false];
        let mut current: Option<State> = None;
        for (i, pass) in pattern.iter().enumerate() {
            let millis = i as i64 * 50;
            let observation = if *pass { ok(millis) } else { failed(millis) };
            let (state, _) = detect(current.as_ref(), observation);
            assert_eq!(state.contiguous_failures == 0, state.status == Status::Ok);
            assert_eq!(state.first_failure_at.is_some(), state.is_failure());
            current = Some(state);
        }
    }

    #[test]
    fn test_clock_going_backwards_reports_zero_duration() {
        let previous = detect(None, failed(1_000)).0;
        let (_, transition) = detect(Some(&previous), ok(0));
        match transition {
            Some(Transition::Recovered {
                failure_duration_secs,
                ..
            }) => assert_eq!(failure_duration_secs, 0.0),
            other => panic!("expected recovery, got {:?}", other),
        }
    }
}
