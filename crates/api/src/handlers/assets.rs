//! Handlers for asset records and storage URLs.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use mediadesk_cloud::{AssetPatch, AssetRecord, DataModelClient, NewAsset, ObjectStorage, Scope};

use crate::error::{AppError, AppResult};
use crate::query::{ScopeParams, StorageKeyParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// An asset with a time-limited thumbnail URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    #[serde(flatten)]
    pub asset: AssetRecord,
    pub thumbnail_url: Option<String>,
}

/// A retrieval URL for one storage key.
#[derive(Debug, Serialize)]
pub struct StorageUrl {
    pub key: String,
    pub url: String,
    pub expires_in_secs: u64,
}

fn require(value: Option<String>, name: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}

fn scope_from(params: ScopeParams) -> AppResult<Scope> {
    Ok(Scope {
        organization_id: require(params.organization_id, "organization_id")?,
        project_id: require(params.project_id, "project_id")?,
    })
}

/// Attach a thumbnail URL. Signing failures leave it empty.
async fn with_thumbnail(
    storage: &dyn ObjectStorage,
    asset: AssetRecord,
    ttl: std::time::Duration,
) -> AssetView {
    let thumbnail_url = match asset.thumbnail_key.as_deref() {
        Some(key) => match storage.retrieval_url(key, ttl).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(asset_id = %asset.id, key, error = %e, "Thumbnail URL failed");
                None
            }
        },
        None => None,
    };
    AssetView {
        asset,
        thumbnail_url,
    }
}

// ---------------------------------------------------------------------------
// GET /assets
// ---------------------------------------------------------------------------

pub async fn list_assets(
    State(state): State<AppState>,
    Query(params): Query<ScopeParams>,
) -> AppResult<impl IntoResponse> {
    let scope = scope_from(params)?;
    let records = state.data_client.list_assets(&scope).await?;

    let ttl = state.config.storage_url_ttl();
    let mut assets = Vec::with_capacity(records.len());
    for record in records {
        assets.push(with_thumbnail(state.storage.as_ref(), record, ttl).await);
    }
    Ok(Json(DataResponse { data: assets }))
}

// ---------------------------------------------------------------------------
// POST /assets
// ---------------------------------------------------------------------------

pub async fn create_asset(
    State(state): State<AppState>,
    Query(params): Query<ScopeParams>,
    Json(mut body): Json<NewAsset>,
) -> AppResult<impl IntoResponse> {
    let scope = scope_from(params)?;
    body.name = require(Some(body.name), "name")?;
    body.storage_key = require(Some(body.storage_key), "storageKey")?;

    let record = state.data_client.create_asset(&scope, body).await?;
    tracing::info!(
        asset_id = %record.id,
        organization_id = %scope.organization_id,
        project_id = %scope.project_id,
        "Asset created"
    );
    let view = with_thumbnail(state.storage.as_ref(), record, state.config.storage_url_ttl()).await;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

// ---------------------------------------------------------------------------
// PATCH /assets/{id}
// ---------------------------------------------------------------------------

pub async fn update_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ScopeParams>,
    Json(mut body): Json<AssetPatch>,
) -> AppResult<impl IntoResponse> {
    let scope = scope_from(params)?;
    if let Some(name) = body.name.take() {
        body.name = Some(require(Some(name), "name")?);
    }

    let record = state.data_client.update_asset(&scope, &id, body).await?;
    tracing::info!(asset_id = %record.id, "Asset updated");
    let view = with_thumbnail(state.storage.as_ref(), record, state.config.storage_url_ttl()).await;
    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// GET /assets/url
// ---------------------------------------------------------------------------

pub async fn storage_url(
    State(state): State<AppState>,
    Query(params): Query<StorageKeyParams>,
) -> AppResult<impl IntoResponse> {
    let ttl = state.config.storage_url_ttl();
    let url = state.storage.retrieval_url(&params.key, ttl).await?;
    Ok(Json(DataResponse {
        data: StorageUrl {
            key: params.key,
            url,
            expires_in_secs: ttl.as_secs(),
        },
    }))
}
