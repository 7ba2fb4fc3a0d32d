//! Data model client: asset records scoped by organization and project.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CloudError;

/// Tenant filter applied to every data model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub organization_id: String,
    pub project_id: String,
}

/// An asset as stored by the managed data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: String,
    pub name: String,
    pub organization_id: String,
    pub project_id: String,
    /// Key of the original media in object storage.
    pub storage_key: String,
    #[serde(default)]
    pub thumbnail_key: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating an asset record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub name: String,
    pub storage_key: String,
    pub thumbnail_key: Option<String>,
    pub mime_type: Option<String>,
}

/// Partial update of an asset record. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_key: Option<String>,
}

/// Managed data service handle.
#[async_trait]
pub trait DataModelClient: Send + Sync {
    async fn list_assets(&self, scope: &Scope) -> Result<Vec<AssetRecord>, CloudError>;

    async fn create_asset(&self, scope: &Scope, input: NewAsset)
        -> Result<AssetRecord, CloudError>;

    async fn update_asset(
        &self,
        scope: &Scope,
        id: &str,
        patch: AssetPatch,
    ) -> Result<AssetRecord, CloudError>;
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Process-local model client used when no data API is configured.
#[derive(Default)]
pub struct InMemoryModelClient {
    assets: RwLock<Vec<AssetRecord>>,
}

impl InMemoryModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a fixed set of records.
    pub fn with_assets(assets: Vec<AssetRecord>) -> Self {
        Self {
            assets: RwLock::new(assets),
        }
    }
}

fn in_scope(asset: &AssetRecord, scope: &Scope) -> bool {
    asset.organization_id == scope.organization_id && asset.project_id == scope.project_id
}

#[async_trait]
impl DataModelClient for InMemoryModelClient {
    async fn list_assets(&self, scope: &Scope) -> Result<Vec<AssetRecord>, CloudError> {
        Ok(self
            .assets
            .read()
            .await
            .iter()
            .filter(|a| in_scope(a, scope))
            .cloned()
            .collect())
    }

    async fn create_asset(
        &self,
        scope: &Scope,
        input: NewAsset,
    ) -> Result<AssetRecord, CloudError> {
        let record = AssetRecord {
            id: mediadesk_core::types::new_id().to_string(),
            name: input.name,
            organization_id: scope.organization_id.clone(),
            project_id: scope.project_id.clone(),
            storage_key: input.storage_key,
            thumbnail_key: input.thumbnail_key,
            mime_type: input.mime_type,
            created_at: Some(Utc::now()),
        };
        self.assets.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_asset(
        &self,
        scope: &Scope,
        id: &str,
        patch: AssetPatch,
    ) -> Result<AssetRecord, CloudError> {
        let mut assets = self.assets.write().await;
        let asset = assets
            .iter_mut()
            .find(|a| a.id == id && in_scope(a, scope))
            .ok_or_else(|| CloudError::NotFound(format!("asset {id}")))?;
        if let Some(name) = patch.name {
            asset.name = name;
        }
        if patch.thumbnail_key.is_some() {
            asset.thumbnail_key = patch.thumbnail_key;
        }
        Ok(asset.clone())
    }
}
