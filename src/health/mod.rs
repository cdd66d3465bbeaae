//! Health check scheduling subsystem.
//!
//! # Data Flow
//! ```text
//! Scheduler::start / start_check
//!     → one lane per check (active.rs)
//!     → lane ticks: probe (probe.rs)
//!     → observation folded into state (state.rs + transition.rs)
//!     → transition → listener (listener.rs)     ┐ off the lane,
//!     → finalized state → on_complete hook       ┘ via dispatch.rs
//!
//! Scheduler::stop / stop_check
//!     → cancel lanes → retire and clear their state
//! ```
//!
//! # Design Decisions
//! - Lanes share nothing but the state store
//! - A probe failure is data, never a scheduler error
//! - Notifications are best-effort and never block a lane

mod active;
pub mod config;
mod dispatch;
pub mod error;
pub mod listener;
pub mod probe;
pub mod scheduler;
pub mod state;
pub mod transition;

pub use config::{CheckConfig, OnComplete};
pub use error::{Error, Result};
pub use listener::StatusListener;
pub use probe::{BlockingProbe, FnProbe, Probe, ProbeError, ProbeResult};
pub use scheduler::{Scheduler, SchedulerOptions, StartDelay};
pub use state::{Observation, State, StateStore, Status};
pub use transition::{detect, Transition};
