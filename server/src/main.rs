//! Post bridge service.
//!
//! Consumes post requests from Redpanda, serves them from `PostgreSQL`, and
//! publishes replies to the topic each request names.

mod config;

use config::Config;
use metrics_exporter_prometheus::PrometheusBuilder;
use post_bridge_core::Dispatcher;
use post_bridge_postgres::PostgresPostStore;
use post_bridge_redpanda::{PostRequestListener, RedpandaReplyPublisher};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "post_bridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting post bridge");

    let config = Config::from_env();
    info!(
        partition = %config.partition,
        redpanda_brokers = %config.redpanda.brokers,
        inbound_topic = %config.redpanda.inbound_topic,
        consumer_group = %config.redpanda.consumer_group,
        "Configuration loaded"
    );

    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics.port))
        .install()?;
    info!(port = config.metrics.port, "Prometheus metrics exporter installed");

    info!("Connecting to post database...");
    let store =
        PostgresPostStore::connect(&config.postgres.url, config.postgres.max_connections).await?;
    store.migrate().await?;
    info!("Post database ready");

    let dispatcher = Dispatcher::new(Arc::new(store), config.partition.clone());

    info!("Connecting to Redpanda...");
    let publisher = RedpandaReplyPublisher::builder()
        .brokers(&config.redpanda.brokers)
        .build()?;
    let listener = PostRequestListener::builder()
        .brokers(&config.redpanda.brokers)
        .topic(&config.redpanda.inbound_topic)
        .consumer_group(&config.redpanda.consumer_group)
        .auto_offset_reset(&config.redpanda.auto_offset_reset)
        .concurrency(config.redpanda.concurrency)
        .build()?;

    listener
        .run_until(&dispatcher, &publisher, shutdown_signal())
        .await?;

    info!("Post bridge stopped");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
