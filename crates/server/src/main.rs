use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use refire_executor::{CancellationToken, DelayQueue, SequentialWorker, WorkerMetrics};
use refire_firefly::FireflyDispatcher;
use refire_provider::{DynDispatcher, LogDispatcher};
use refire_server::api::AppState;
use refire_server::config::{ConfigSnapshot, RefireConfig};

/// Delayed, rate-limited re-trigger relay for ledger webhooks.
#[derive(Parser, Debug)]
#[command(name = "refire-server", about = "Webhook relay that re-triggers ledger transactions")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "refire.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = RefireConfig::load(&cli.config)?;
    config.apply_env()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let telemetry_guard = refire_server::telemetry::init(&config.telemetry);

    if !Path::new(&cli.config).exists() {
        info!(path = %cli.config, "config file not found, using defaults");
    }
    ConfigSnapshot::from(&config).log_summary();
    for issue in config.validate() {
        issue.log();
    }

    let dispatcher: Arc<dyn DynDispatcher> = if config.firefly.dry_run {
        info!("dry run enabled, triggers will only be logged");
        Arc::new(LogDispatcher::new("dry-run"))
    } else {
        Arc::new(FireflyDispatcher::new(
            config.firefly.to_dispatcher_config(),
        )?)
    };

    let queue = Arc::new(DelayQueue::with_capacity(config.dispatch.max_pending));
    let metrics = Arc::new(WorkerMetrics::default());
    let shutdown = CancellationToken::new();
    let worker = SequentialWorker::new(
        Arc::clone(&queue),
        dispatcher,
        config.dispatch.to_worker_config(),
        Arc::clone(&metrics),
    )
    .spawn(shutdown.clone());

    let state = AppState {
        queue: Arc::clone(&queue),
        metrics,
        worker_state: worker.subscribe(),
    };
    let app = refire_server::api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "refire-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // No new webhooks arrive past this point; stop the worker and discard
    // whatever is still waiting.
    let pending = queue.len();
    shutdown.cancel();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    info!(
        pending,
        timeout_secs = config.server.shutdown_timeout_seconds,
        "stopping worker, queued transactions are dropped"
    );
    match tokio::time::timeout(shutdown_timeout, worker.join()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "worker task ended abnormally"),
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded, in-flight trigger abandoned"
        ),
    }

    // Flush pending OpenTelemetry spans before exit.
    telemetry_guard.shutdown();

    info!("refire-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
