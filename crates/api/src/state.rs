use std::sync::Arc;

use mediadesk_cloud::{DataModelClient, ObjectStorage};
use mediadesk_events::EventBus;
use mediadesk_worker::DeliveryService;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all handlers via Axum's `State`
/// extractor.
///
/// Must be `Clone` (Axum requirement). All inner fields are `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Job store, registries and simulators.
    pub delivery: Arc<DeliveryService>,
    pub ws_manager: Arc<WsManager>,
    pub event_bus: Arc<EventBus>,
    /// Retrieval URL generator for storage keys.
    pub storage: Arc<dyn ObjectStorage>,
    /// Asset records by organization and project.
    pub data_client: Arc<dyn DataModelClient>,
}
