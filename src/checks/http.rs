//! HTTP probe.
//!
//! Issues a GET against a URL and passes when the response carries the
//! expected status code. The request is bounded by the configured timeout;
//! the scheduler itself never times a probe out.

use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::health::{Probe, ProbeResult};

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_STATUS_CODE: u16 = 200;

#[derive(Error, Debug)]
pub enum HttpCheckError {
    #[error("URL cannot be empty")]
    MissingUrl,

    #[error("unable to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("error during check request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("received status code '{actual}' does not match expected status code '{expected}'")]
    UnexpectedStatus { expected: u16, actual: u16 },
}

/// Configuration of an HTTP check. Only `url` is required.
#[derive(Debug, Clone)]
pub struct HttpCheckConfig {
    pub url: Option<Url>,
    /// Expected response status (default 200).
    pub status_code: u16,
    /// Request timeout (default 3s).
    pub timeout: Duration,
    /// Client to reuse; one is built from `timeout` when absent.
    pub client: Option<reqwest::Client>,
}

impl HttpCheckConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url: Some(url),
            ..Default::default()
        }
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }
}

impl Default for HttpCheckConfig {
    fn default() -> Self {
        Self {
            url: None,
            status_code: DEFAULT_STATUS_CODE,
            timeout: DEFAULT_HTTP_TIMEOUT,
            client: None,
        }
    }
}

/// Probe that checks an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpCheck {
    url: Url,
    status_code: u16,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpCheck {
    /// Validate `config` and fill in defaults.
    pub fn new(config: HttpCheckConfig) -> Result<Self, HttpCheckError> {
        let url = config.url.ok_or(HttpCheckError::MissingUrl)?;
        let status_code = if config.status_code == 0 {
            DEFAULT_STATUS_CODE
        } else {
            config.status_code
        };
        let timeout = if config.timeout.is_zero() {
            DEFAULT_HTTP_TIMEOUT
        } else {
            config.timeout
        };

        let client = match config.client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(timeout)
                .pool_max_idle_per_host(0)
                .build()
                .map_err(HttpCheckError::Client)?,
        };

        Ok(Self {
            url,
            status_code,
            timeout,
            client,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one request, returning the latency on success.
    pub async fn check(&self) -> Result<Duration, HttpCheckError> {
        let start = Instant::now();
        let response = self
            .client
            .get(self.url.clone())
            .header(reqwest::header::CONNECTION, "close")
            .header(reqwest::header::USER_AGENT, "healthwatch-http-check")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(HttpCheckError::Request)?;

        let actual = response.status().as_u16();
        // Drain the body so the connection closes cleanly.
        response.bytes().await.map_err(HttpCheckError::Request)?;

        if actual != self.status_code {
            return Err(HttpCheckError::UnexpectedStatus {
                expected: self.status_code,
                actual,
            });
        }

        Ok(start.elapsed())
    }
}

impl Probe for HttpCheck {
    fn status(&self) -> BoxFuture<'_, ProbeResult> {
        self.run().boxed()
    }
}

impl HttpCheck {
    async fn run(&self) -> ProbeResult {
        let latency = self.check().await?;
        Ok(Some(json!({
            "latency_ms": latency.as_secs_f64() * 1000.0,
            "status_code": self.status_code,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_is_mandatory() {
        let err = HttpCheck::new(HttpCheckConfig::default()).unwrap_err();
        assert!(matches!(err, HttpCheckError::MissingUrl));
    }

    #[test]
    fn test_default_values() {
        let check = HttpCheck::new(HttpCheckConfig::new(
            Url::parse("https://example.com/health").unwrap(),
        ))
        .unwrap();
        assert_eq!(check.status_code(), 200);
        assert_eq!(check.timeout(), DEFAULT_HTTP_TIMEOUT);
    }

    #[test]
    fn test_zero_values_fall_back_to_defaults() {
        let mut config = HttpCheckConfig::new(Url::parse("http://localhost/").unwrap());
        config.status_code = 0;
        config.timeout = Duration::ZERO;
        let check = HttpCheck::new(config).unwrap();
        assert_eq!(check.status_code(), DEFAULT_STATUS_CODE);
        assert_eq!(check.timeout(), DEFAULT_HTTP_TIMEOUT);
    }

    #[test]
    fn test_override_default_values() {
        let check = HttpCheck::new(
            HttpCheckConfig::new(Url::parse("https://example.com/").unwrap())
                .with_status_code(404)
                .with_timeout(Duration::from_millis(100))
                .with_client(reqwest::Client::new()),
        )
        .unwrap();
        assert_eq!(check.status_code(), 404);
        assert_eq!(check.timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_unexpected_status_message() {
        let err = HttpCheckError::UnexpectedStatus {
            expected: 200,
            actual: 500,
        };
        assert_eq!(
            err.to_string(),
            "received status code '500' does not match expected status code '200'"
        );
    }
}
