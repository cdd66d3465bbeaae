//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! healthd.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → reload.rs::apply (register checks)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates the new file
//!     → reload.rs::reconcile (diff by check name)
//!     → scheduler unregisters / registers / starts
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - An invalid file on reload is logged and ignored

pub mod loader;
pub mod reload;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use reload::{apply, build_check, reconcile, ReloadSummary};
pub use schema::{AppConfig, CheckSpec, ObservabilityConfig, SchedulerConfig, ServerConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
