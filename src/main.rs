use anyhow::{anyhow, Context, Result};
use axum::{http::StatusCode, routing::get, Router};
use http_telemetry::config::AppConfig;
use http_telemetry::{with_telemetry, HttpMetrics, MetricsExporter};
use prometheus::Registry;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal telemetry service error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration from environment")?;
    let addr = config.socket_addr()?;

    let exporter = MetricsExporter::new(Registry::new());
    let metrics = Arc::new(
        HttpMetrics::new(&config.namespace, exporter.registry())
            .context("register HTTP instruments")?,
    );

    let api = Router::new().route("/health", get(health_check));
    let app = with_telemetry(api, metrics)
        .merge(exporter.router(&config.metrics_path))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(
        address = %addr,
        namespace = %config.namespace,
        metrics_path = %config.metrics_path,
        "HTTP server starting"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    info!("Shutdown complete");
    Ok(())
}

/// Health check endpoint
async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl_c listener error");
    }
    info!("Shutdown signal received, draining connections");
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
