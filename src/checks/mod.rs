//! Concrete probes.
//!
//! Anything implementing [`Probe`](crate::health::Probe) can be scheduled;
//! this module ships the ones the daemon can build from configuration.

pub mod http;

pub use http::{HttpCheck, HttpCheckConfig, HttpCheckError};
