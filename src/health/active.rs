//! Per-check execution lane.
//!
//! # Lifecycle
//! ```text
//! Pending ──(start delay)──▶ Running ──(cancel / retired)──▶ Stopped
//! ```
//!
//! While running, the lane probes once immediately and then on every
//! interval tick. Cancellation is only observed between probes; an
//! in-flight probe is never interrupted. Slow probes delay the next tick
//! instead of overlapping it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::health::config::CheckConfig;
use crate::health::dispatch::Notifier;
use crate::health::listener::{deliver, StatusListener};
use crate::health::state::{Observation, StateStore};
use crate::observability::metrics;

/// Handle to a running lane, owned by the scheduler.
///
/// Dropping it drops the cancellation sender, which also stops the lane.
pub(crate) struct Lane {
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Lane {
    pub(crate) fn spawn(runtime: &Handle, runner: CheckRunner) -> Self {
        let (cancel, cancelled) = oneshot::channel();
        let handle = runtime.spawn(runner.run(cancelled));
        Self { cancel, handle }
    }

    /// Signal the lane to stop and hand back its task handle.
    pub(crate) fn cancel(self) -> JoinHandle<()> {
        let _ = self.cancel.send(());
        self.handle
    }
}

/// Everything a lane needs to run one check.
pub(crate) struct CheckRunner {
    pub(crate) config: Arc<CheckConfig>,
    pub(crate) store: Arc<StateStore>,
    pub(crate) epoch: u64,
    pub(crate) start_delay: Duration,
    pub(crate) listener: Option<Arc<dyn StatusListener>>,
    pub(crate) notifier: Notifier,
}

impl CheckRunner {
    async fn run(self, mut cancelled: oneshot::Receiver<()>) {
        let name = self.config.name();

        if !self.start_delay.is_zero() {
            tracing::debug!(
                check = %name,
                delay_ms = self.start_delay.as_millis() as u64,
                "Delaying check start"
            );
            tokio::select! {
                biased;
                _ = &mut cancelled => {
                    tracing::debug!(check = %name, "Check stopped before first run");
                    return;
                }
                _ = time::sleep(self.start_delay) => {}
            }
        }

        tracing::info!(
            check = %name,
            interval_ms = self.config.interval().as_millis() as u64,
            "Check starting"
        );

        let mut ticker = time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut cancelled => {
                    tracing::info!(check = %name, "Check received stop signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    if !self.run_once().await {
                        tracing::debug!(check = %name, "Check retired, exiting loop");
                        break;
                    }
                }
            }
        }
    }

    /// Probe once and record the result. Returns false once retired.
    async fn run_once(&self) -> bool {
        let name = self.config.name();
        let started = Instant::now();
        let outcome = self.config.probe().status().await;
        let elapsed = started.elapsed();

        match &outcome {
            Ok(_) => tracing::debug!(check = %name, elapsed_ms = elapsed.as_millis() as u64, "Check passed"),
            Err(e) => tracing::warn!(check = %name, error = %e, "Check failed"),
        }

        let observation = Observation::new(name, Utc::now(), outcome);
        let Some((state, transition)) = self.store.record(self.epoch, observation) else {
            return false;
        };
        metrics::record_check_run(name, state.status, elapsed);

        if let Some(transition) = transition {
            metrics::record_transition(name, transition.kind());
            if let Some(listener) = &self.listener {
                let listener = Arc::clone(listener);
                self.notifier
                    .notify(name, move || deliver(listener.as_ref(), &transition));
            }
        }

        if let Some(hook) = self.config.completion_hook() {
            let hook = Arc::clone(hook);
            self.notifier.notify(name, move || (*hook)(&state));
        }

        true
    }
}
