//! Periodic health checks.
//!
//! Register checks with a [`Scheduler`], start it, and read the latest
//! [`State`] of every check at any time. Transitions between healthy and
//! failing are reported to an optional [`StatusListener`].

pub mod checks;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use health::{CheckConfig, Error, Probe, Result, Scheduler, State, Status, StatusListener};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
