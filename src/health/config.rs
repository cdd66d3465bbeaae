//! Check descriptors.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::health::error::{Error, Result};
use crate::health::probe::Probe;
use crate::health::state::State;

/// Hook invoked with the finalized state after every run of a check.
pub type OnComplete = Arc<dyn Fn(&State) + Send + Sync>;

/// Immutable configuration of one check.
#[derive(Clone)]
pub struct CheckConfig {
    name: String,
    probe: Arc<dyn Probe>,
    interval: Duration,
    on_complete: Option<OnComplete>,
}

impl CheckConfig {
    /// Create a check descriptor.
    ///
    /// Fails with [`Error::InvalidCheck`] if `name` is empty or `interval`
    /// is zero.
    pub fn new(name: impl Into<String>, probe: impl Probe, interval: Duration) -> Result<Self> {
        Self::from_shared(name, Arc::new(probe), interval)
    }

    /// Like [`CheckConfig::new`] for a probe that is already shared.
    pub fn from_shared(
        name: impl Into<String>,
        probe: Arc<dyn Probe>,
        interval: Duration,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidCheck("check name cannot be empty".to_string()));
        }
        if interval.is_zero() {
            return Err(Error::InvalidCheck(format!(
                "check '{}' must have a positive interval",
                name
            )));
        }

        Ok(Self {
            name,
            probe,
            interval,
            on_complete: None,
        })
    }

    /// Set the completion hook.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn probe(&self) -> &Arc<dyn Probe> {
        &self.probe
    }

    pub(crate) fn completion_hook(&self) -> Option<&OnComplete> {
        self.on_complete.as_ref()
    }
}

impl fmt::Debug for CheckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckConfig")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::{FnProbe, ProbeResult};

    fn probe() -> impl Probe {
        FnProbe::new(|| async { ProbeResult::Ok(None) })
    }

    #[test]
    fn test_rejects_empty_name() {
        let err = CheckConfig::new("  ", probe(), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidCheck(_)));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = CheckConfig::new("db", probe(), Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("positive interval"));
    }

    #[test]
    fn test_builder() {
        let config = CheckConfig::new("db", probe(), Duration::from_millis(250))
            .unwrap()
            .on_complete(|_| {});
        assert_eq!(config.name(), "db");
        assert_eq!(config.interval(), Duration::from_millis(250));
        assert!(config.completion_hook().is_some());
        assert!(format!("{:?}", config).contains("on_complete: true"));
    }
}
