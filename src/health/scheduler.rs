//! The check scheduler.
//!
//! # Responsibilities
//! - Own the registry of check descriptors
//! - Run one independent lane per active check
//! - Start and stop single checks or the whole set
//! - Expose point-in-time copies of every check's state
//!
//! # Locking
//! The descriptor registry, the lane map and the state store each have
//! their own lock. When more than one is needed they are taken in that
//! order, and none is held across an `.await`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::join_all;
use rand::Rng;
use tokio::runtime::Handle;

use crate::health::active::{CheckRunner, Lane};
use crate::health::config::CheckConfig;
use crate::health::dispatch::Notifier;
use crate::health::error::{Error, Result};
use crate::health::listener::StatusListener;
use crate::health::state::{State, StateStore};
use crate::observability::metrics;

/// Computes the delay before a check's first run, once per lane launch.
pub type StartDelay = Arc<dyn Fn(&str) -> Duration + Send + Sync>;

/// Tuning knobs for a [`Scheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// How long [`Scheduler::stop`] waits for lanes to exit.
    pub shutdown_grace: Duration,

    /// Pending listener and completion notifications before new ones are
    /// dropped.
    pub notify_queue_capacity: usize,

    /// Listener and completion callbacks allowed to run at once.
    pub max_concurrent_notifications: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            shutdown_grace: Duration::from_secs(1),
            notify_queue_capacity: 256,
            max_concurrent_notifications: 16,
        }
    }
}

/// Runs health checks on their own intervals and tracks their state.
///
/// Lanes run on the Tokio runtime that is current when [`start`] or
/// [`start_check`] is called. Dropping the scheduler stops every lane.
///
/// [`start`]: Scheduler::start
/// [`start_check`]: Scheduler::start_check
pub struct Scheduler {
    configs: RwLock<Vec<Arc<CheckConfig>>>,
    lanes: DashMap<String, Lane>,
    store: Arc<StateStore>,
    started: AtomicBool,
    listener: Option<Arc<dyn StatusListener>>,
    start_delay: StartDelay,
    notifier: Mutex<Option<Notifier>>,
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_options(SchedulerOptions::default())
    }

    pub fn with_options(options: SchedulerOptions) -> Self {
        Self {
            configs: RwLock::new(Vec::new()),
            lanes: DashMap::new(),
            store: Arc::new(StateStore::new()),
            started: AtomicBool::new(false),
            listener: None,
            start_delay: Arc::new(|_| Duration::ZERO),
            notifier: Mutex::new(None),
            options,
        }
    }

    /// Attach a listener for failure, still-failing and recovery events.
    pub fn with_listener<L: StatusListener>(mut self, listener: L) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Attach a listener that is shared with other owners.
    pub fn with_shared_listener(mut self, listener: Arc<dyn StatusListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Replace the start-delay function.
    pub fn with_start_delay<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Duration + Send + Sync + 'static,
    {
        self.start_delay = Arc::new(f);
        self
    }

    /// Delay each check's first run by a random amount in `[0, max)`.
    pub fn with_start_jitter(self, max: Duration) -> Self {
        let max_nanos = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
        if max_nanos == 0 {
            return self;
        }
        self.with_start_delay(move |_| {
            Duration::from_nanos(rand::thread_rng().gen_range(0..max_nanos))
        })
    }

    /// Add a check. Does not start it, even if the scheduler is running.
    pub fn register(&self, config: CheckConfig) -> Result<()> {
        let mut configs = self.configs.write().unwrap_or_else(PoisonError::into_inner);
        if configs.iter().any(|c| c.name() == config.name()) {
            return Err(Error::DuplicateName(config.name().to_string()));
        }

        tracing::info!(
            check = %config.name(),
            interval_ms = config.interval().as_millis() as u64,
            "Registered check"
        );
        configs.push(Arc::new(config));
        Ok(())
    }

    /// Remove a check, stopping it first if it is running.
    pub fn unregister(&self, name: &str) -> Result<()> {
        let mut configs = self.configs.write().unwrap_or_else(PoisonError::into_inner);
        let idx = configs
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        if self.halt(name) {
            tracing::info!(check = %name, "Stopped check");
        }
        configs.remove(idx);
        tracing::info!(check = %name, "Removed check");
        Ok(())
    }

    /// Start every registered check.
    pub fn start(&self) -> Result<()> {
        let runtime = Handle::try_current()?;
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyStarted);
        }

        let configs = self.configs.read().unwrap_or_else(PoisonError::into_inner).clone();
        let mut launched = 0;
        for config in configs {
            let name = config.name().to_string();
            match self.launch(&runtime, config) {
                Ok(()) => launched += 1,
                Err(Error::AlreadyRunning(_)) => {
                    tracing::debug!(check = %name, "Check already running, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(checks = launched, "Scheduler started");
        Ok(())
    }

    /// Start a single registered check.
    pub fn start_check(&self, name: &str) -> Result<()> {
        let runtime = Handle::try_current()?;
        let config = self
            .find(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        self.launch(&runtime, config)
    }

    /// Stop a single running check and forget its state.
    ///
    /// Returns once the stop signal is issued; a probe already in flight
    /// finishes in the background and its result is discarded.
    pub fn stop_check(&self, name: &str) -> Result<()> {
        if !self.halt(name) {
            return Err(Error::NotFound(name.to_string()));
        }
        tracing::info!(check = %name, "Stopped check");
        Ok(())
    }

    /// Stop every check, drop its state and mark the scheduler stopped.
    ///
    /// Waits up to [`SchedulerOptions::shutdown_grace`] for lanes to exit;
    /// lanes still busy after that are abandoned and cannot write state.
    /// Only the lanes present when `stop` is called are affected; a check
    /// started while `stop` waits keeps running.
    pub async fn stop(&self) {
        let names: Vec<String> = self.lanes.iter().map(|lane| lane.key().clone()).collect();
        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            if let Some((name, lane)) = self.lanes.remove(&name) {
                tracing::info!(check = %name, "Stopping check");
                handles.push(lane.cancel());
                self.store.retire(&name);
                metrics::record_stopped(&name);
            }
        }

        self.notifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let grace = self.options.shutdown_grace;
        if tokio::time::timeout(grace, join_all(handles)).await.is_err() {
            tracing::warn!(
                grace_ms = grace.as_millis() as u64,
                "Some checks did not exit within the shutdown grace period"
            );
        }

        self.started.store(false, Ordering::SeqCst);
        tracing::info!("Scheduler stopped");
    }

    /// Point-in-time copy of every check's latest state.
    pub fn states(&self) -> HashMap<String, State> {
        self.store.snapshot()
    }

    /// Latest state of one check.
    pub fn state(&self, name: &str) -> Option<State> {
        self.store.get(name)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.lanes.contains_key(name)
    }

    /// Registered check names, in registration order.
    pub fn check_names(&self) -> Vec<String> {
        self.configs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Names of checks with a running lane, sorted.
    pub fn running_checks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lanes.iter().map(|lane| lane.key().clone()).collect();
        names.sort();
        names
    }

    fn find(&self, name: &str) -> Option<Arc<CheckConfig>> {
        self.configs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.name() == name)
            .cloned()
    }

    fn launch(&self, runtime: &Handle, config: Arc<CheckConfig>) -> Result<()> {
        match self.lanes.entry(config.name().to_string()) {
            Entry::Occupied(entry) => Err(Error::AlreadyRunning(entry.key().clone())),
            Entry::Vacant(slot) => {
                let name = config.name();
                let runner = CheckRunner {
                    epoch: self.store.admit(name),
                    start_delay: (self.start_delay)(name),
                    store: Arc::clone(&self.store),
                    listener: self.listener.clone(),
                    notifier: self.notifier(runtime),
                    config: Arc::clone(&config),
                };
                slot.insert(Lane::spawn(runtime, runner));
                metrics::record_started(name);
                tracing::info!(check = %config.name(), "Started check");
                Ok(())
            }
        }
    }

    /// Cancel the lane for `name` and drop its state. Returns false if no
    /// lane was running.
    fn halt(&self, name: &str) -> bool {
        let Some((_, lane)) = self.lanes.remove(name) else {
            return false;
        };
        // Detached: the lane exits on its own once its probe returns.
        drop(lane.cancel());
        self.store.retire(name);
        metrics::record_stopped(name);
        true
    }

    fn notifier(&self, runtime: &Handle) -> Notifier {
        let mut slot = self.notifier.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert_with(|| {
            let (notifier, _dispatcher) = Notifier::spawn(
                runtime,
                self.options.notify_queue_capacity,
                self.options.max_concurrent_notifications,
            );
            notifier
        })
        .clone()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
