//! HTTP status endpoint.
//!
//! # Data Flow
//! ```text
//! GET /health        → handlers.rs → Scheduler::states → aggregate report
//! GET /health/{name} → handlers.rs → Scheduler::state  → one State or 404
//! ```

pub mod handlers;
pub mod server;

pub use handlers::HealthReport;
pub use server::HttpServer;
