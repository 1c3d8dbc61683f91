use anyhow::{Context, Result};
use content_service::{
    start_api_server, AppState, Config, ContentStore, ImageUploader, PreviewComposer,
    RatingAggregator,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_tracing(&config.service.log_level);

    info!(
        service = %config.service.name,
        "Starting Oasys Content Service"
    );

    // Initialize metrics
    init_metrics(config.service.metrics_port)?;

    let store = Arc::new(
        ContentStore::new(&config.database)
            .await
            .context("Failed to initialize content store")?,
    );

    if config.database.run_migrations {
        store
            .run_migrations()
            .await
            .context("Failed to run database migrations")?;
    }

    let uploader = Arc::new(
        ImageUploader::new(&config.spaces)
            .await
            .context("Failed to initialize image uploader")?,
    );

    let fetch_timeout = config.rating_fetch_timeout();
    match fetch_timeout {
        Some(timeout) => info!(timeout_ms = timeout.as_millis() as u64, "Rating fetch timeout enabled"),
        None => warn!("No rating fetch timeout configured; rating lookups wait indefinitely"),
    }

    let aggregator = RatingAggregator::new(store.clone()).with_fetch_timeout(fetch_timeout);

    let state = AppState {
        store: store.clone(),
        previews: store.clone(),
        composer: PreviewComposer::new(aggregator),
        uploader,
        docs_url: config.api.docs_url.clone(),
    };

    info!(address = %config.listen_addr(), "Content service started successfully");

    start_api_server(state, &config.api, shutdown_signal()).await?;

    info!("Content service stopped");

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}

/// Initialize Prometheus metrics exporter
fn init_metrics(port: u16) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    info!(port = port, "Prometheus metrics exporter started");

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }

    info!("Shutting down content service");
}
