//! Configuration schema definitions.
//!
//! All sections default, so a file with only `[[checks]]` entries is a
//! complete configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::health::SchedulerOptions;

/// Root configuration for the daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Health endpoint listener.
    pub server: ServerConfig,

    /// Scheduler tuning.
    pub scheduler: SchedulerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Checks to run.
    pub checks: Vec<CheckSpec>,
}

/// Health endpoint listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound of the random delay before each check's first run.
    pub start_jitter_ms: u64,

    /// How long shutdown waits for running checks to finish.
    pub shutdown_grace_ms: u64,

    /// Pending notifications before new ones are dropped.
    pub notify_queue_capacity: usize,

    /// Listener callbacks allowed to run at once.
    pub max_concurrent_notifications: usize,
}

impl SchedulerConfig {
    pub fn start_jitter(&self) -> Duration {
        Duration::from_millis(self.start_jitter_ms)
    }

    pub fn options(&self) -> SchedulerOptions {
        SchedulerOptions {
            shutdown_grace: Duration::from_millis(self.shutdown_grace_ms),
            notify_queue_capacity: self.notify_queue_capacity,
            max_concurrent_notifications: self.max_concurrent_notifications,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let options = SchedulerOptions::default();
        Self {
            start_jitter_ms: 0,
            shutdown_grace_ms: options.shutdown_grace.as_millis() as u64,
            notify_queue_capacity: options.notify_queue_capacity,
            max_concurrent_notifications: options.max_concurrent_notifications,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One HTTP check.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CheckSpec {
    /// Unique, case-sensitive check name.
    pub name: String,

    /// URL to probe.
    pub url: String,

    /// Time between runs in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Expected response status.
    #[serde(default = "default_status_code")]
    pub status_code: u16,
}

fn default_interval_ms() -> u64 {
    10_000
}

fn default_timeout_ms() -> u64 {
    3_000
}

fn default_status_code() -> u16 {
    200
}

impl CheckSpec {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
