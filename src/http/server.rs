//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router with the health handlers
//! - Wire up request tracing
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::health::Scheduler;
use crate::http::handlers::{get_check, get_health};

/// Read-only HTTP view over a scheduler's state.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self {
            router: Self::build_router(scheduler),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(scheduler: Arc<Scheduler>) -> Router {
        Router::new()
            .route("/health", get(get_health))
            .route("/health/{name}", get(get_check))
            .with_state(scheduler)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
