//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lanes and transitions produce:
//!     → logging.rs (structured log events, LogListener)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogListener};
