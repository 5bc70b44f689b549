//! Sync bridge binary entrypoint.
//! Boots the Axum HTTP server (manual trigger + liveness) and the hourly scheduler.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use supabase_notion_sync::api::{self, AppState};
use supabase_notion_sync::metrics::Metrics;
use supabase_notion_sync::scheduler::start_sync_scheduler;
use supabase_notion_sync::telemetry::{init_tracing, DEFAULT_LOG_FILTER};
use supabase_notion_sync::{build_http_client, build_sync_job, BridgeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing(DEFAULT_LOG_FILTER, false);

    let cfg = BridgeConfig::load().context("loading configuration")?;
    let client = build_http_client(&cfg)?;
    let job = build_sync_job(&cfg, client);

    let mut app = api::router(AppState::new(job.clone()));
    if cfg.metrics_enabled {
        let metrics = Metrics::init()?;
        app = app.merge(metrics.router());
        info!("metrics exposed on /metrics");
    }

    let listener = TcpListener::bind(("0.0.0.0", cfg.port))
        .await
        .with_context(|| format!("binding port {}", cfg.port))?;
    info!(port = cfg.port, "sync bridge running");

    let scheduler = if cfg.scheduler_enabled {
        Some(start_sync_scheduler(job, &cfg.sync_cron).await?)
    } else {
        info!("scheduler disabled; only POST /sync triggers a run");
        None
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    if let Some(s) = scheduler {
        s.shutdown().await?;
    }
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
