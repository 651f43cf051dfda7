use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cycle_tracking_cell::{
    HealthNotificationWorker, InMemoryCycleStore, LoggingDispatcher, NotificationService,
    NotificationWorkerConfig, SystemClock,
};
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting health notifier");

    let config = AppConfig::from_env();

    let store = match &config.cycle_data_path {
        Some(path) => InMemoryCycleStore::load_from_path(path)
            .await
            .with_context(|| format!("failed to load cycle data from {}", path))?,
        None => InMemoryCycleStore::new(),
    };
    let store = Arc::new(store);

    let worker_config = NotificationWorkerConfig::from_app_config(&config);
    let notifications = Arc::new(NotificationService::new(store.clone(), store.clone()));

    info!(
        "Checking every {}s (retry after {}s), pill window {} minutes",
        worker_config.check_interval.as_secs(),
        worker_config.retry_delay.as_secs(),
        worker_config.pill_window_minutes
    );

    let worker = Arc::new(HealthNotificationWorker::new(
        worker_config,
        notifications,
        Arc::new(LoggingDispatcher),
        Arc::new(SystemClock),
    ));

    let worker_handle = {
        let worker = Arc::clone(&worker);
        tokio::spawn(async move { worker.start().await })
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    worker.shutdown();

    match worker_handle.await {
        Ok(Ok(())) => info!("Health notifier stopped"),
        Ok(Err(e)) => error!("Worker exited with error: {}", e),
        Err(e) => error!("Worker task panicked: {}", e),
    }

    Ok(())
}
