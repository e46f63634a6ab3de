use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use lead_scraper::app_state::AppState;
use lead_scraper::config::AppConfig;
use lead_scraper::routes;
use lead_scraper::services::{
    job_store::JobStore,
    queue::{JobQueue, ShutdownMode},
    scrapers::ScraperSet,
    webhook::WebhookDispatcher,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!(app_env = %config.app_env, "Initializing lead-scraper server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("scrape_jobs_submitted_total", "Scrape jobs accepted");
    metrics::describe_counter!("scrape_jobs_completed_total", "Scrape jobs completed");
    metrics::describe_counter!("scrape_jobs_failed_total", "Scrape jobs that failed");
    metrics::describe_histogram!(
        "scrape_job_duration_seconds",
        "Time spent running a single scrape"
    );
    metrics::describe_gauge!("scrape_queue_depth", "Jobs waiting for the worker");
    metrics::describe_counter!(
        "webhook_deliveries_total",
        "Webhook delivery attempts by event and outcome"
    );

    let webhooks = WebhookDispatcher::new(config.webhook_config())
        .expect("Failed to initialize webhook client");
    let scrapers = ScraperSet::live(config.browser_config(), config.dns_timeout());

    let store = Arc::new(JobStore::new());
    let queue = Arc::new(JobQueue::new(
        store.clone(),
        scrapers,
        webhooks,
        config.queue_config(),
    ));
    queue.start();

    let state = AppState::new(store, queue.clone(), &config.api_key);
    let app = routes::create_router(state, Some(prometheus_handle));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("HTTP server stopped, draining job queue");
    queue.shutdown(ShutdownMode::Drain).await;
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
