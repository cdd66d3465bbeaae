//! Listener capability notified of check transitions.

use crate::health::state::State;
use crate::health::transition::Transition;

/// Receives failure, continued-failure and recovery notifications.
///
/// Calls are best-effort and run off the check's lane, on Tokio's blocking
/// pool. Under heavy load or during shutdown a notification may be dropped,
/// and calls for consecutive ticks may arrive out of order.
pub trait StatusListener: Send + Sync + 'static {
    /// The check went from passing (or unknown) to failing.
    fn check_failed(&self, state: &State);

    /// The check passed again.
    ///
    /// * `recorded_failures` - failures in the streak that just ended
    /// * `failure_duration_secs` - seconds between the first failure of the
    ///   streak and this recovery
    fn check_recovered(&self, state: &State, recorded_failures: u64, failure_duration_secs: f64);

    /// The check failed again; `recorded_failures` counts the streak before
    /// this failure.
    fn still_failing(&self, state: &State, recorded_failures: u64);
}

/// Route a transition to the matching listener method.
pub(crate) fn deliver(listener: &dyn StatusListener, transition: &Transition) {
    match transition {
        Transition::Failed { state } => listener.check_failed(state),
        Transition::StillFailing {
            state,
            recorded_failures,
        } => listener.still_failing(state, *recorded_failures),
        Transition::Recovered {
            state,
            recorded_failures,
            failure_duration_secs,
        } => listener.check_recovered(state, *recorded_failures, *failure_duration_secs),
    }
}
