use anyhow::Context;
use axum::{routing::get, Router};
use babywatch::ayla::AylaSource;
use babywatch::{metrics, rest, Config, Pipeline};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    info!("Starting babywatch");
    info!("HTTP server: {}", config.http_addr);
    info!(
        "Vendor region: {} ({})",
        config.pipeline.region, config.vendor.ads_url
    );
    info!(
        "Retry policy: {} attempts, {:?} apart, {:?} per attempt",
        config.pipeline.retry.attempts,
        config.pipeline.retry.delay,
        config.pipeline.retry.attempt_timeout
    );
    info!("Classifier rules: {}", config.pipeline.rules);
    info!("Age timezone: {}", config.profile.timezone);
    if config.vendor.email.is_empty() {
        error!("OWLET_EMAIL is not set, every status will be degraded");
    }

    metrics::init_metrics().context("failed to register metrics")?;

    let source = AylaSource::new(config.vendor.clone(), config.pipeline.retry.attempt_timeout)
        .context("failed to build vendor client")?;
    let pipeline = Arc::new(Pipeline::new(
        config.pipeline.clone(),
        config.profile.clone(),
        Arc::new(source),
    ));

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(rest::create_router(pipeline));

    let listener = tokio::net::TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.http_addr))?;

    info!("HTTP server listening on {}", config.http_addr);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap_or_else(|e| {
            error!("HTTP server error: {}", e);
        });
    });

    tokio::select! {
        _ = server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
    Ok(())
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}
