//! Handlers for delivery jobs, destinations and presets.
//!
//! Thin adapters over [`DeliveryService`](mediadesk_worker::DeliveryService);
//! all validation and state transitions happen there.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use mediadesk_core::delivery::destination::{CreateDestination, UpdateDestination};
use mediadesk_core::delivery::job::{CreateDeliveryJob, JobStatus};
use mediadesk_core::delivery::preset::{CreatePreset, UpdatePreset};
use mediadesk_core::types::EntityId;
use mediadesk_worker::JobFilter;

use crate::error::AppResult;
use crate::query::JobListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /delivery/jobs/{id}/fail`.
#[derive(Debug, Default, Deserialize)]
pub struct FailJobRequest {
    #[serde(default)]
    pub reason: String,
}

// ===========================================================================
// JOBS
// ===========================================================================

// ---------------------------------------------------------------------------
// GET /delivery/jobs
// ---------------------------------------------------------------------------

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = JobFilter {
        status: params
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(JobStatus::from_name)
            .transpose()?,
        limit: params.limit,
        offset: params.offset,
    };
    let jobs = state.delivery.list_jobs(&filter).await;
    Ok(Json(DataResponse { data: jobs }))
}

// ---------------------------------------------------------------------------
// POST /delivery/jobs
// ---------------------------------------------------------------------------

pub async fn create_job(
    State(state): State<AppState>,
    Json(body): Json<CreateDeliveryJob>,
) -> AppResult<impl IntoResponse> {
    let job = state.delivery.create_job(body).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: job })))
}

// ---------------------------------------------------------------------------
// GET /delivery/jobs/{id}
// ---------------------------------------------------------------------------

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let job = state.delivery.get_job(id).await?;
    Ok(Json(DataResponse { data: job }))
}

// ---------------------------------------------------------------------------
// POST /delivery/jobs/{id}/retry
// ---------------------------------------------------------------------------

pub async fn retry_job(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let job = state.delivery.retry_job(id).await?;
    Ok(Json(DataResponse { data: job }))
}

// ---------------------------------------------------------------------------
// POST /delivery/jobs/{id}/cancel
// ---------------------------------------------------------------------------

pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let job = state.delivery.cancel_job(id).await?;
    Ok(Json(DataResponse { data: job }))
}

// ---------------------------------------------------------------------------
// POST /delivery/jobs/{id}/fail
// ---------------------------------------------------------------------------

pub async fn fail_job(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(body): Json<FailJobRequest>,
) -> AppResult<impl IntoResponse> {
    let job = state.delivery.fail_job(id, &body.reason).await?;
    Ok(Json(DataResponse { data: job }))
}

// ===========================================================================
// DESTINATIONS
// ===========================================================================

pub async fn list_destinations(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let destinations = state.delivery.list_destinations().await;
    Ok(Json(DataResponse { data: destinations }))
}

pub async fn create_destination(
    State(state): State<AppState>,
    Json(body): Json<CreateDestination>,
) -> AppResult<impl IntoResponse> {
    let destination = state.delivery.create_destination(body).await?;
    tracing::info!(
        id = %destination.id,
        name = %destination.name,
        platform = destination.platform.label(),
        "Destination created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: destination })))
}

pub async fn get_destination(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let destination = state.delivery.get_destination(id).await?;
    Ok(Json(DataResponse { data: destination }))
}

pub async fn update_destination(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(body): Json<UpdateDestination>,
) -> AppResult<impl IntoResponse> {
    let destination = state.delivery.update_destination(id, body).await?;
    Ok(Json(DataResponse { data: destination }))
}

pub async fn toggle_destination(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let destination = state.delivery.toggle_destination(id).await?;
    Ok(Json(DataResponse { data: destination }))
}

pub async fn delete_destination(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<StatusCode> {
    state.delivery.delete_destination(id).await?;
    tracing::info!(id = %id, "Destination deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ===========================================================================
// PRESETS
// ===========================================================================

pub async fn list_presets(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let presets = state.delivery.list_presets().await;
    Ok(Json(DataResponse { data: presets }))
}

pub async fn create_preset(
    State(state): State<AppState>,
    Json(body): Json<CreatePreset>,
) -> AppResult<impl IntoResponse> {
    let preset = state.delivery.create_preset(body).await?;
    tracing::info!(id = %preset.id, name = %preset.name, "Preset saved");
    Ok((StatusCode::CREATED, Json(DataResponse { data: preset })))
}

pub async fn get_preset(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let preset = state.delivery.get_preset(id).await?;
    Ok(Json(DataResponse { data: preset }))
}

pub async fn update_preset(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(body): Json<UpdatePreset>,
) -> AppResult<impl IntoResponse> {
    let preset = state.delivery.update_preset(id, body).await?;
    Ok(Json(DataResponse { data: preset }))
}

pub async fn delete_preset(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<StatusCode> {
    state.delivery.delete_preset(id).await?;
    tracing::info!(id = %id, "Preset deleted");
    Ok(StatusCode::NO_CONTENT)
}
