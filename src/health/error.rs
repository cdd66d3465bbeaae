//! Scheduler error types.
//!
//! Only lifecycle and registration mistakes surface here. A failing probe is
//! never an `Error`; it is folded into the check's [`State`](super::State).

use thiserror::Error;

/// Errors returned by [`Scheduler`](super::Scheduler) operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("check '{0}' is already registered")]
    DuplicateName(String),

    #[error("check '{0}' not found")]
    NotFound(String),

    #[error("scheduler already started")]
    AlreadyStarted,

    #[error("check '{0}' is already running")]
    AlreadyRunning(String),

    #[error("invalid check configuration: {0}")]
    InvalidCheck(String),

    #[error("no Tokio runtime available to run checks: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Result type alias for scheduler operations.
pub type Result<T> = std::result::Result<T, Error>;
