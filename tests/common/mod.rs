//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use healthwatch::health::{FnProbe, Probe, ProbeResult, State, StatusListener};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start a programmable mock backend on an ephemeral port.
///
/// Every connection gets the `(status, body)` produced by `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Read the request head before answering.
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            204 => "204 No Content",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock backend that always answers with `status`.
pub async fn start_mock_backend(status: u16) -> SocketAddr {
    start_programmable_backend(move || async move { (status, "ok".to_string()) }).await
}

/// Probe whose n-th invocation (1-based) fails when `fails(n)` is true.
///
/// Returns the probe and its invocation counter.
pub fn sequence_probe<F>(fails: F) -> (impl Probe, Arc<AtomicU64>)
where
    F: Fn(u64) -> bool + Send + Sync + 'static,
{
    let calls = Arc::new(AtomicU64::new(0));
    let counter = calls.clone();
    let fails = Arc::new(fails);
    let probe = FnProbe::new(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        let fails = fails.clone();
        async move {
            if (*fails)(n) {
                ProbeResult::Err(format!("invocation {} failed", n).into())
            } else {
                ProbeResult::Ok(None)
            }
        }
    });
    (probe, calls)
}

/// Probe that always passes.
pub fn passing_probe() -> impl Probe {
    FnProbe::new(|| async { ProbeResult::Ok(None) })
}

/// A listener notification as seen by [`RecordingListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Failed {
        check: String,
    },
    StillFailing {
        check: String,
        recorded_failures: u64,
    },
    Recovered {
        check: String,
        recorded_failures: u64,
        failure_duration_secs: f64,
    },
}

/// Listener that stores every notification it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl StatusListener for RecordingListener {
    fn check_failed(&self, state: &State) {
        self.push(Event::Failed {
            check: state.name.clone(),
        });
    }

    fn check_recovered(&self, state: &State, recorded_failures: u64, failure_duration_secs: f64) {
        self.push(Event::Recovered {
            check: state.name.clone(),
            recorded_failures,
            failure_duration_secs,
        });
    }

    fn still_failing(&self, state: &State, recorded_failures: u64) {
        self.push(Event::StillFailing {
            check: state.name.clone(),
            recorded_failures,
        });
    }
}

/// Give lanes and the notification dispatcher time to settle.
pub async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
