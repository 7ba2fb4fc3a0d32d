use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediadesk_api::background::job_retention;
use mediadesk_api::config::ServerConfig;
use mediadesk_api::notifications::JobUpdateRelay;
use mediadesk_api::router::build_app_router;
use mediadesk_api::state::AppState;
use mediadesk_api::ws;
use mediadesk_cloud::{
    DataModelClient, GraphqlModelClient, InMemoryModelClient, ObjectStorage, S3ObjectStorage,
    StaticObjectStorage,
};
use mediadesk_events::{EventBus, NotificationDispatcher, WebhookDelivery};
use mediadesk_worker::DeliveryService;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mediadesk_api=debug,mediadesk_worker=debug,tower_http=debug".into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    let delivery_config = match config.delivery_config() {
        Ok(delivery_config) => delivery_config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid delivery configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Persistence ---
    let store = mediadesk_db::open_store(config.data_dir.clone())
        .await
        .expect("Failed to open data directory");
    mediadesk_db::health_check(store.as_ref())
        .await
        .expect("Store health check failed");
    tracing::info!(data_dir = %config.data_dir.display(), "Key-value store opened");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let background_cancel = CancellationToken::new();
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), background_cancel.clone());

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // Subscribe consumers before the service starts so resumed jobs are seen.
    let relay = JobUpdateRelay::new(Arc::clone(&ws_manager));
    let relay_handle = tokio::spawn(relay.run(event_bus.subscribe(), background_cancel.clone()));

    let dispatcher = NotificationDispatcher::new(Arc::new(WebhookDelivery::new()));
    let dispatcher_handle =
        tokio::spawn(dispatcher.run(event_bus.subscribe(), background_cancel.clone()));
    tracing::info!("Event services started (job relay, webhook dispatcher)");

    // --- Delivery service ---
    let delivery = DeliveryService::start(store, Arc::clone(&event_bus), delivery_config).await;
    tracing::info!(
        active = delivery.active_simulators().await,
        "Delivery service started"
    );

    let retention_handle = tokio::spawn(job_retention::run(
        Arc::clone(&delivery),
        job_retention::SWEEP_INTERVAL,
        background_cancel.clone(),
    ));

    // --- External collaborators ---
    let storage: Arc<dyn ObjectStorage> = match config.storage.bucket.as_deref() {
        Some(bucket) => {
            tracing::info!(bucket, region = %config.storage.region, "Using S3 presigned URLs");
            Arc::new(S3ObjectStorage::from_env(bucket, config.storage.region.clone()).await)
        }
        None => {
            tracing::info!(base_url = %config.storage.public_base_url, "Using static storage URLs");
            Arc::new(StaticObjectStorage::new(config.storage.public_base_url.clone()))
        }
    };
    let data_client: Arc<dyn DataModelClient> = match config.data_api.as_ref() {
        Some(api) => {
            tracing::info!(url = %api.url, "Using GraphQL data API");
            Arc::new(GraphqlModelClient::new(api.url.clone(), api.api_key.clone()))
        }
        None => {
            tracing::info!("Using in-memory data model");
            Arc::new(InMemoryModelClient::new())
        }
    };

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        delivery: Arc::clone(&delivery),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
        storage,
        data_client,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let timeout = Duration::from_secs(config.shutdown_timeout_secs);

    // Stop simulators and flush state before the consumers go away.
    if tokio::time::timeout(timeout, delivery.shutdown()).await.is_err() {
        tracing::warn!("Delivery service shutdown timed out");
    }

    background_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), relay_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), heartbeat_handle).await;
    tracing::info!("Background tasks stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
