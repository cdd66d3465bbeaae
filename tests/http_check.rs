//! HTTP probe against mock backends.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use healthwatch::checks::{HttpCheck, HttpCheckConfig, HttpCheckError};
use healthwatch::health::{CheckConfig, Probe, Scheduler, Status};
use url::Url;

mod common;

fn check_for(addr: std::net::SocketAddr) -> HttpCheckConfig {
    HttpCheckConfig::new(Url::parse(&format!("http://{}/health", addr)).unwrap())
        .with_timeout(Duration::from_millis(500))
}

#[tokio::test]
async fn test_http_check_ok() {
    let addr = common::start_mock_backend(200).await;
    let check = HttpCheck::new(check_for(addr)).unwrap();

    let details = check.status().await.unwrap().unwrap();
    assert_eq!(details["status_code"], 200);
    assert!(details["latency_ms"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_http_check_unexpected_status() {
    let addr = common::start_mock_backend(503).await;
    let check = HttpCheck::new(check_for(addr)).unwrap();

    match check.check().await {
        Err(HttpCheckError::UnexpectedStatus { expected, actual }) => {
            assert_eq!(expected, 200);
            assert_eq!(actual, 503);
        }
        other => panic!("expected status mismatch, got {:?}", other),
    }

    let err = check.status().await.unwrap_err();
    assert!(err.to_string().contains("'503'"));
}

#[tokio::test]
async fn test_http_check_custom_status() {
    let addr = common::start_mock_backend(404).await;
    let check = HttpCheck::new(check_for(addr).with_status_code(404)).unwrap();
    assert!(check.status().await.is_ok());
}

#[tokio::test]
async fn test_http_check_unreachable() {
    // Grab a free port, then release it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let check = HttpCheck::new(check_for(addr)).unwrap();
    let err = check.check().await.unwrap_err();
    assert!(matches!(err, HttpCheckError::Request(_)));
    assert!(err.to_string().starts_with("error during check request"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scheduled_http_check_tracks_backend() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    // Healthy for two requests, then failing.
    let addr = common::start_programmable_backend(move || {
        let cc = cc.clone();
        async move {
            if cc.fetch_add(1, Ordering::SeqCst) < 2 {
                (200, "ok".into())
            } else {
                (500, "down".into())
            }
        }
    })
    .await;

    let scheduler = Scheduler::new();
    let probe = HttpCheck::new(check_for(addr)).unwrap();
    scheduler
        .register(CheckConfig::new("backend", probe, Duration::from_millis(100)).unwrap())
        .unwrap();
    scheduler.start().unwrap();

    common::settle(150).await;
    assert_eq!(scheduler.state("backend").unwrap().status, Status::Ok);

    common::settle(300).await;
    let state = scheduler.state("backend").unwrap();
    assert_eq!(state.status, Status::Failed);
    assert!(state.contiguous_failures >= 1);
    assert!(state.error.unwrap().contains("'500'"));

    scheduler.stop().await;
}
