//! Pluggable probe capability.
//!
//! A probe is invoked once per tick and either returns an optional JSON
//! payload describing the success, or an error whose text becomes the
//! check's failure message. The scheduler imposes no timeout; a probe that
//! talks to the network must bound itself.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;

/// Opaque error produced by a probe.
pub type ProbeError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of one probe invocation.
pub type ProbeResult = Result<Option<Value>, ProbeError>;

/// A single health-verification operation.
pub trait Probe: Send + Sync + 'static {
    /// Run the check once.
    fn status(&self) -> BoxFuture<'_, ProbeResult>;
}

/// Probe backed by an async closure.
pub struct FnProbe<F> {
    f: F,
}

impl<F, Fut> FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ProbeResult> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ProbeResult> + Send + 'static,
{
    fn status(&self) -> BoxFuture<'_, ProbeResult> {
        (self.f)().boxed()
    }
}

/// Probe backed by a synchronous closure that may block.
///
/// Each invocation runs on Tokio's blocking pool so a slow call never
/// stalls the runtime worker driving other lanes.
pub struct BlockingProbe<F> {
    f: Arc<F>,
}

impl<F> BlockingProbe<F>
where
    F: Fn() -> ProbeResult + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

impl<F> Probe for BlockingProbe<F>
where
    F: Fn() -> ProbeResult + Send + Sync + 'static,
{
    fn status(&self) -> BoxFuture<'_, ProbeResult> {
        let f = Arc::clone(&self.f);
        async move {
            match tokio::task::spawn_blocking(move || (*f)()).await {
                Ok(result) => result,
                Err(e) => Err(format!("probe task failed: {}", e).into()),
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_probe_passes_payload_through() {
        let probe = FnProbe::new(|| async { ProbeResult::Ok(Some(json!({"rows": 3}))) });
        let result = probe.status().await.unwrap();
        assert_eq!(result, Some(json!({"rows": 3})));
    }

    #[tokio::test]
    async fn test_blocking_probe_reports_error() {
        let probe = BlockingProbe::new(|| Err("disk full".into()));
        let err = probe.status().await.unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[tokio::test]
    async fn test_blocking_probe_contains_panic() {
        let probe = BlockingProbe::new(|| panic!("boom"));
        let err = probe.status().await.unwrap_err();
        assert!(err.to_string().starts_with("probe task failed"));
    }
}
