//! Applying configurations to a scheduler.
//!
//! A reload compares the running configuration with the new one by check
//! name. Scheduler settings (jitter, grace, queue sizes) and listener
//! addresses only take effect on restart.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::checks::{HttpCheck, HttpCheckConfig};
use crate::config::loader::ConfigError;
use crate::config::schema::{AppConfig, CheckSpec};
use crate::health::{CheckConfig, Scheduler};

/// Build a schedulable check from its configuration entry.
pub fn build_check(spec: &CheckSpec) -> Result<CheckConfig, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidCheck {
        name: spec.name.clone(),
        message,
    };

    let url = spec.url.parse().map_err(|e: url::ParseError| invalid(e.to_string()))?;
    let probe = HttpCheck::new(
        HttpCheckConfig::new(url)
            .with_status_code(spec.status_code)
            .with_timeout(spec.timeout()),
    )
    .map_err(|e| invalid(e.to_string()))?;

    CheckConfig::new(spec.name.clone(), probe, spec.interval()).map_err(|e| invalid(e.to_string()))
}

/// Register every check in `config`. Checks are not started.
pub fn apply(scheduler: &Scheduler, config: &AppConfig) -> Result<(), ConfigError> {
    for spec in &config.checks {
        let check = build_check(spec)?;
        scheduler.register(check).map_err(|e| ConfigError::InvalidCheck {
            name: spec.name.clone(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

/// What a reconcile changed, by check name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReloadSummary {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
}

impl ReloadSummary {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Bring `scheduler` from `current` to `next`.
///
/// Removed and changed checks are unregistered, which stops their lanes and
/// drops their state. New and changed checks are registered, and started
/// when the scheduler is running. A check that fails to build is skipped
/// and logged; the rest of the reload still applies.
pub fn reconcile(scheduler: &Scheduler, current: &AppConfig, next: &AppConfig) -> ReloadSummary {
    let old: HashMap<&str, &CheckSpec> =
        current.checks.iter().map(|c| (c.name.as_str(), c)).collect();
    let new: HashMap<&str, &CheckSpec> = next.checks.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut summary = ReloadSummary::default();

    for spec in &current.checks {
        if !new.contains_key(spec.name.as_str()) {
            if let Err(e) = scheduler.unregister(&spec.name) {
                tracing::warn!(check = %spec.name, error = %e, "Failed to remove check");
            }
            summary.removed.push(spec.name.clone());
        }
    }

    for spec in &next.checks {
        let changed = match old.get(spec.name.as_str()) {
            None => false,
            Some(previous) if *previous == spec => continue,
            Some(_) => true,
        };

        let check = match build_check(spec) {
            Ok(check) => check,
            Err(e) => {
                tracing::error!(check = %spec.name, error = %e, "Skipping check");
                continue;
            }
        };

        if changed {
            if let Err(e) = scheduler.unregister(&spec.name) {
                tracing::warn!(check = %spec.name, error = %e, "Failed to replace check");
            }
        }
        if let Err(e) = scheduler.register(check) {
            tracing::error!(check = %spec.name, error = %e, "Failed to register check");
            continue;
        }
        if scheduler.is_started() {
            if let Err(e) = scheduler.start_check(&spec.name) {
                tracing::error!(check = %spec.name, error = %e, "Failed to start check");
            }
        }

        if changed {
            summary.updated.push(spec.name.clone());
        } else {
            summary.added.push(spec.name.clone());
        }
    }

    summary
}

/// Apply configurations from `updates` until shutdown or the channel closes.
pub async fn run_reloader(
    scheduler: Arc<Scheduler>,
    mut current: AppConfig,
    mut updates: mpsc::UnboundedReceiver<AppConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(next) = update else { break };
                let summary = reconcile(&scheduler, &current, &next);
                if summary.is_empty() {
                    tracing::debug!("Config reloaded, checks unchanged");
                } else {
                    tracing::info!(
                        added = ?summary.added,
                        removed = ?summary.removed,
                        updated = ?summary.updated,
                        "Config reloaded"
                    );
                }
                current = next;
            }
            _ = shutdown.recv() => {
                tracing::debug!("Config reloader shutting down");
                break;
            }
        }
    }
}
