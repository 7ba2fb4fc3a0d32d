//! GraphQL backend for [`DataModelClient`].
//!
//! Sends `{query, variables}` POSTs to a single endpoint with an
//! `x-api-key` header and unwraps the `data` / `errors` envelope.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::CloudError;
use crate::model::{AssetPatch, AssetRecord, DataModelClient, NewAsset, Scope};

const ASSET_FIELDS: &str =
    "id name organizationId projectId storageKey thumbnailKey mimeType createdAt";

/// HTTP client for the managed GraphQL data API.
pub struct GraphqlModelClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAssetsData {
    list_assets: ItemsPage,
}

#[derive(Debug, Deserialize)]
struct ItemsPage {
    items: Vec<AssetRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAssetData {
    create_asset: AssetRecord,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAssetData {
    update_asset: Option<AssetRecord>,
}

impl GraphqlModelClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, api_key)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, CloudError> {
        let body = serde_json::json!({ "query": query, "variables": variables });
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.header("x-api-key", key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphqlResponse<T> = response.json().await?;
        unwrap_envelope(envelope)
    }
}

fn unwrap_envelope<T>(envelope: GraphqlResponse<T>) -> Result<T, CloudError> {
    if !envelope.errors.is_empty() {
        let joined = envelope
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(CloudError::GraphQl(joined));
    }
    envelope
        .data
        .ok_or_else(|| CloudError::GraphQl("Response carried no data".to_string()))
}

#[async_trait]
impl DataModelClient for GraphqlModelClient {
    async fn list_assets(&self, scope: &Scope) -> Result<Vec<AssetRecord>, CloudError> {
        let query = format!(
            "query ListAssets($organizationId: ID!, $projectId: ID!) {{ \
               listAssets(filter: {{ organizationId: {{ eq: $organizationId }}, \
                                     projectId: {{ eq: $projectId }} }}) {{ items {{ {ASSET_FIELDS} }} }} }}"
        );
        let data: ListAssetsData = self
            .execute(
                &query,
                serde_json::json!({
                    "organizationId": scope.organization_id,
                    "projectId": scope.project_id,
                }),
            )
            .await?;
        Ok(data.list_assets.items)
    }

    async fn create_asset(
        &self,
        scope: &Scope,
        input: NewAsset,
    ) -> Result<AssetRecord, CloudError> {
        let query = format!(
            "mutation CreateAsset($input: CreateAssetInput!) {{ \
               createAsset(input: $input) {{ {ASSET_FIELDS} }} }}"
        );
        let mut fields = serde_json::to_value(&input).map_err(|e| CloudError::GraphQl(e.to_string()))?;
        fields["organizationId"] = serde_json::json!(scope.organization_id);
        fields["projectId"] = serde_json::json!(scope.project_id);
        let data: CreateAssetData = self
            .execute(&query, serde_json::json!({ "input": fields }))
            .await?;
        Ok(data.create_asset)
    }

    async fn update_asset(
        &self,
        scope: &Scope,
        id: &str,
        patch: AssetPatch,
    ) -> Result<AssetRecord, CloudError> {
        let query = format!(
            "mutation UpdateAsset($input: UpdateAssetInput!, $condition: ModelAssetConditionInput) {{ \
               updateAsset(input: $input, condition: $condition) {{ {ASSET_FIELDS} }} }}"
        );
        let mut fields = serde_json::to_value(&patch).map_err(|e| CloudError::GraphQl(e.to_string()))?;
        fields["id"] = serde_json::json!(id);
        let condition = serde_json::json!({
            "organizationId": { "eq": scope.organization_id },
            "projectId": { "eq": scope.project_id },
        });
        let data: UpdateAssetData = self
            .execute(
                &query,
                serde_json::json!({ "input": fields, "condition": condition }),
            )
            .await?;
        data.update_asset
            .ok_or_else(|| CloudError::NotFound(format!("asset {id}")))
    }
}
