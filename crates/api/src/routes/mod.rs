pub mod assets;
pub mod delivery;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                        WebSocket (?job_id= filter)
///
/// /delivery/jobs                             list, create
/// /delivery/jobs/{id}                        get
/// /delivery/jobs/{id}/retry                  retry (POST)
/// /delivery/jobs/{id}/cancel                 cancel (POST)
/// /delivery/jobs/{id}/fail                   fail (POST)
///
/// /delivery/destinations                     list, create
/// /delivery/destinations/{id}                get, update, delete
/// /delivery/destinations/{id}/toggle         toggle active (POST)
///
/// /delivery/presets                          list, create
/// /delivery/presets/{id}                     get, update, delete
///
/// /assets                                    list, create (scoped by organization/project)
/// /assets/{id}                               update (PATCH)
/// /assets/url                                retrieval URL for a storage key
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/delivery", delivery::router())
        .nest("/assets", assets::router())
}
