#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use mediadesk_api::config::{DeliverySettings, ServerConfig, StorageConfig};
use mediadesk_api::router::build_app_router;
use mediadesk_api::state::AppState;
use mediadesk_api::ws::WsManager;
use mediadesk_cloud::{DataModelClient, InMemoryModelClient, StaticObjectStorage};
use mediadesk_db::{KvHandle, MemoryKvStore};
use mediadesk_events::EventBus;
use mediadesk_worker::DeliveryService;

/// Build a test `ServerConfig` with the development defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        data_dir: PathBuf::from("./data"),
        delivery: DeliverySettings {
            tick_ms: 500,
            duration_ms: 10_000,
            retention_days: 7,
        },
        storage: StorageConfig {
            bucket: None,
            region: "us-east-1".to_string(),
            public_base_url: "http://localhost:3000/files".to_string(),
            url_ttl_secs: 3600,
        },
        data_api: None,
    }
}

/// Build application state over the given store and data model client,
/// starting a real delivery service.
pub async fn build_test_state(
    store: KvHandle,
    data_client: Arc<dyn DataModelClient>,
) -> AppState {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());
    let delivery = DeliveryService::start(
        store,
        Arc::clone(&event_bus),
        config.delivery_config().unwrap(),
    )
    .await;

    AppState {
        config: Arc::new(config.clone()),
        delivery,
        ws_manager: Arc::new(WsManager::new()),
        event_bus,
        storage: Arc::new(StaticObjectStorage::new(config.storage.public_base_url.clone())),
        data_client,
    }
}

/// Build the full application router (same middleware stack as `main.rs`)
/// over an in-memory store and an empty data model.
pub async fn build_test_app() -> Router {
    let state = build_test_state(
        Arc::new(MemoryKvStore::new()),
        Arc::new(InMemoryModelClient::new()),
    )
    .await;
    build_app_router(state, &test_config())
}

pub fn router_for(state: AppState) -> Router {
    build_app_router(state, &test_config())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post(app: Router, uri: &str) -> Response {
    send_json(app, Method::POST, uri, serde_json::json!({})).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::PUT, uri, body).await
}

pub async fn patch_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::PATCH, uri, body).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn send_json(app: Router, method: Method, uri: &str, body: serde_json::Value) -> Response {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
