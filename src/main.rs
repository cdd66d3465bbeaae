//! healthd: runs the configured health checks and serves their state.
//!
//! ```text
//!   healthd.toml ──▶ config ──▶ Scheduler ──▶ one lane per check ──▶ probes
//!        │                          │
//!        └── watcher ── reconcile ──┤
//!                                   ▼
//!                     GET /health, GET /health/{name}
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use healthwatch::config::{self, reload, ConfigWatcher};
use healthwatch::health::Scheduler;
use healthwatch::http::HttpServer;
use healthwatch::lifecycle::{wait_for_shutdown, Shutdown};
use healthwatch::observability::{init_logging, metrics, LogListener};

#[derive(Parser)]
#[command(name = "healthd")]
#[command(about = "Periodic health check daemon", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "healthd.toml")]
    config: PathBuf,

    /// Do not reload the configuration when the file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let app_config = config::load_config(&args.config)?;
    init_logging(&app_config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        checks = app_config.checks.len(),
        "healthd starting"
    );

    if app_config.observability.metrics_enabled {
        let addr: SocketAddr = app_config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let scheduler = Arc::new(
        Scheduler::with_options(app_config.scheduler.options())
            .with_listener(LogListener)
            .with_start_jitter(app_config.scheduler.start_jitter()),
    );
    config::apply(&scheduler, &app_config)?;
    scheduler.start()?;

    let shutdown = Shutdown::new();

    // Keep the watcher alive until exit.
    let _watcher = if args.no_watch {
        None
    } else {
        let (watcher, updates) = ConfigWatcher::new(&args.config);
        let watcher = watcher.run()?;
        tokio::spawn(reload::run_reloader(
            Arc::clone(&scheduler),
            app_config.clone(),
            updates,
            shutdown.subscribe(),
        ));
        Some(watcher)
    };

    let listener = TcpListener::bind(&app_config.server.bind_address).await?;
    let server = HttpServer::new(Arc::clone(&scheduler));
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_shutdown().await;
    shutdown.trigger();

    scheduler.stop().await;
    match server_task.await {
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server failed"),
        Err(e) => tracing::error!(error = %e, "HTTP server task panicked"),
        Ok(Ok(())) => {}
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
