//! Route definitions for delivery jobs and their registries.
//!
//! Mounted at `/delivery`:
//!
//! ```text
//! JOBS:
//! GET    /jobs                          list_jobs (?status, limit, offset)
//! POST   /jobs                          create_job
//! GET    /jobs/{id}                     get_job
//! POST   /jobs/{id}/retry               retry_job
//! POST   /jobs/{id}/cancel              cancel_job
//! POST   /jobs/{id}/fail                fail_job
//!
//! DESTINATIONS:
//! GET    /destinations                  list_destinations
//! POST   /destinations                  create_destination
//! GET    /destinations/{id}             get_destination
//! PUT    /destinations/{id}             update_destination
//! DELETE /destinations/{id}             delete_destination
//! POST   /destinations/{id}/toggle      toggle_destination
//!
//! PRESETS:
//! GET    /presets                       list_presets
//! POST   /presets                       create_preset
//! GET    /presets/{id}                  get_preset
//! PUT    /presets/{id}                  update_preset
//! DELETE /presets/{id}                  delete_preset
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::delivery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/jobs", job_router())
        .nest("/destinations", destination_router())
        .nest("/presets", preset_router())
}

fn job_router() -> Router<AppState> {
    Router::new()
        .route("/", get(delivery::list_jobs).post(delivery::create_job))
        .route("/{id}", get(delivery::get_job))
        .route("/{id}/retry", post(delivery::retry_job))
        .route("/{id}/cancel", post(delivery::cancel_job))
        .route("/{id}/fail", post(delivery::fail_job))
}

fn destination_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(delivery::list_destinations).post(delivery::create_destination),
        )
        .route(
            "/{id}",
            get(delivery::get_destination)
                .put(delivery::update_destination)
                .delete(delivery::delete_destination),
        )
        .route("/{id}/toggle", post(delivery::toggle_destination))
}

fn preset_router() -> Router<AppState> {
    Router::new()
        .route("/", get(delivery::list_presets).post(delivery::create_preset))
        .route(
            "/{id}",
            get(delivery::get_preset)
                .put(delivery::update_preset)
                .delete(delivery::delete_preset),
        )
}
