//! Fire-and-forget notification dispatch.
//!
//! # Data Flow
//! ```text
//! lane ──try_send──▶ bounded queue ──▶ dispatcher task
//!                                        → acquire permit
//!                                        → spawn_blocking(callback)
//! ```
//!
//! Lanes never wait on the queue: when it is full the notification is
//! dropped and counted. The semaphore caps how many callbacks run at once,
//! so a stuck listener holds at most that many blocking threads.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::observability::metrics;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable handle lanes use to enqueue notifications.
#[derive(Clone)]
pub(crate) struct Notifier {
    tx: mpsc::Sender<Job>,
}

impl Notifier {
    /// Spawn the dispatcher task on `runtime`.
    pub(crate) fn spawn(
        runtime: &Handle,
        capacity: usize,
        max_concurrent: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let handle = runtime.spawn(run_dispatcher(rx, permits));
        (Self { tx }, handle)
    }

    /// Queue `job` without waiting. Returns false if it was dropped.
    pub(crate) fn notify<F>(&self, check: &str, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.tx.try_send(Box::new(job)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(check = %check, "Notification queue full, dropping notification");
                metrics::record_dropped_notification(check);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(check = %check, "Notification dispatcher stopped, dropping notification");
                false
            }
        }
    }
}

async fn run_dispatcher(mut rx: mpsc::Receiver<Job>, permits: Arc<Semaphore>) {
    while let Some(job) = rx.recv().await {
        let permit = match Arc::clone(&permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        tokio::task::spawn_blocking(move || {
            job();
            drop(permit);
        });
    }
    tracing::debug!("Notification dispatcher exiting");
}
