//! Asset routes, mounted at `/assets`.
//!
//! ```text
//! GET    /            list_assets  (?organization_id, project_id)
//! POST   /            create_asset (?organization_id, project_id)
//! PATCH  /{id}        update_asset (?organization_id, project_id)
//! GET    /url         storage_url  (?key)
//! ```

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::assets;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(assets::list_assets).post(assets::create_asset))
        .route("/url", get(assets::storage_url))
        .route("/{id}", patch(assets::update_asset))
}
