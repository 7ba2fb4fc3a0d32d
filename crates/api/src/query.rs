//! Query parameter types shared across handlers.

use serde::Deserialize;

use mediadesk_core::types::EntityId;

/// `?organization_id=&project_id=` for tenant-scoped listings.
#[derive(Debug, Deserialize)]
pub struct ScopeParams {
    pub organization_id: Option<String>,
    pub project_id: Option<String>,
}

/// `?status=&limit=&offset=` on the job listing. The status is parsed by
/// the handler so an unknown name yields a validation error body.
#[derive(Debug, Default, Deserialize)]
pub struct JobListParams {
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// `?key=` for storage URL lookups.
#[derive(Debug, Deserialize)]
pub struct StorageKeyParams {
    pub key: String,
}

/// `?job_id=` on the WebSocket upgrade. Without it the connection receives
/// updates for every job.
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub job_id: Option<EntityId>,
}
