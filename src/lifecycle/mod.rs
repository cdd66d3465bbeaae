//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_shutdown returns
//!
//! Shutdown (shutdown.rs):
//!     trigger → HTTP server drains, config reloader exits
//!     → Scheduler::stop (bounded grace) → exit
//! ```
//!
//! # Design Decisions
//! - Shutdown has timeout: lanes still busy after the grace period are abandoned

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown;
