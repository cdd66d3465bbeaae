//! Per-check state and the shared state store.
//!
//! # Invariants
//! ```text
//! num_failures > 0        <=>  status == failed
//! first_failure_at = Some <=>  status == failed
//! ```
//!
//! The store is the single authority on which lane may write a given
//! check's entry. A lane is admitted when it launches and retired when the
//! check is stopped; writes from a retired lane are refused, so an
//! in-flight probe finishing after `stop_check` cannot bring the entry back.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::health::probe::ProbeResult;
use crate::health::transition::{detect, Transition};

/// Pass/fail classification of one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest recorded result of a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Name of the check.
    pub name: String,

    /// Outcome of the latest run.
    pub status: Status,

    /// Error text of a failed run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Payload returned by the probe, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,

    /// When the latest run completed.
    pub check_time: DateTime<Utc>,

    /// Number of failures in a row, zero while healthy.
    #[serde(rename = "num_failures")]
    pub contiguous_failures: u64,

    /// Start of the current failure streak.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_failure_at: Option<DateTime<Utc>>,
}

impl State {
    pub fn is_failure(&self) -> bool {
        self.status == Status::Failed
    }
}

/// Raw outcome of one probe invocation, folded into [`State`] and dropped.
#[derive(Debug)]
pub struct Observation {
    pub name: String,
    pub check_time: DateTime<Utc>,
    pub outcome: ProbeResult,
}

impl Observation {
    pub fn new(name: impl Into<String>, check_time: DateTime<Utc>, outcome: ProbeResult) -> Self {
        Self {
            name: name.into(),
            check_time,
            outcome,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    states: HashMap<String, State>,
    /// check name -> epoch of the lane allowed to write it
    writers: HashMap<String, u64>,
    next_epoch: u64,
}

/// Concurrency-safe map from check name to its latest [`State`].
#[derive(Debug, Default)]
pub struct StateStore {
    inner: Mutex<Inner>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Grant a newly launched lane write access to `name`.
    ///
    /// Returns the epoch the lane must present on every write. Admitting a
    /// new lane revokes any previous one for the same name.
    pub(crate) fn admit(&self, name: &str) -> u64 {
        let mut inner = self.lock();
        inner.next_epoch += 1;
        let epoch = inner.next_epoch;
        inner.writers.insert(name.to_string(), epoch);
        epoch
    }

    /// Fold an observation into the stored state.
    ///
    /// Read, detect and replace happen under one lock. Returns `None` when
    /// the lane holding `epoch` has been retired.
    pub(crate) fn record(
        &self,
        epoch: u64,
        observation: Observation,
    ) -> Option<(State, Option<Transition>)> {
        let mut inner = self.lock();
        if inner.writers.get(&observation.name) != Some(&epoch) {
            return None;
        }

        let (state, transition) = detect(inner.states.get(&observation.name), observation);
        inner.states.insert(state.name.clone(), state.clone());
        Some((state, transition))
    }

    /// Revoke write access for `name` and drop its state.
    pub(crate) fn retire(&self, name: &str) -> Option<State> {
        let mut inner = self.lock();
        inner.writers.remove(name);
        inner.states.remove(name)
    }

    /// Point-in-time copy of every state.
    pub fn snapshot(&self) -> HashMap<String, State> {
        self.lock().states.clone()
    }

    pub fn get(&self, name: &str) -> Option<State> {
        self.lock().states.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
