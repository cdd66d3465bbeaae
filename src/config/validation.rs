//! Configuration validation.
//!
//! Serde handles syntax; this pass checks values and cross-references and
//! reports every problem at once.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{AppConfig, CheckSpec};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate `config`, returning every error found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.scheduler.notify_queue_capacity == 0 {
        errors.push(ValidationError::new(
            "scheduler.notify_queue_capacity",
            "must be greater than zero",
        ));
    }
    if config.scheduler.max_concurrent_notifications == 0 {
        errors.push(ValidationError::new(
            "scheduler.max_concurrent_notifications",
            "must be greater than zero",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, check) in config.checks.iter().enumerate() {
        validate_check(idx, check, &mut errors);
        if !check.name.is_empty() && !seen.insert(check.name.as_str()) {
            errors.push(ValidationError::new(
                format!("checks[{}].name", idx),
                format!("duplicate check name '{}'", check.name),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_check(idx: usize, check: &CheckSpec, errors: &mut Vec<ValidationError>) {
    let field = |name: &str| format!("checks[{}].{}", idx, name);

    if check.name.trim().is_empty() {
        errors.push(ValidationError::new(field("name"), "cannot be empty"));
    }

    match Url::parse(&check.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field("url"),
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            field("url"),
            format!("'{}' is not a valid URL: {}", check.url, e),
        )),
    }

    if check.interval_ms == 0 {
        errors.push(ValidationError::new(field("interval_ms"), "must be greater than zero"));
    }
    if check.timeout_ms == 0 {
        errors.push(ValidationError::new(field("timeout_ms"), "must be greater than zero"));
    }
    if !(100..=599).contains(&check.status_code) {
        errors.push(ValidationError::new(
            field("status_code"),
            format!("{} is not an HTTP status code", check.status_code),
        ));
    }
}
