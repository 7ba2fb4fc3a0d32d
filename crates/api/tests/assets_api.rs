//! Integration tests for asset browsing and storage URLs.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{body_json, get, patch_json, post_json};
use mediadesk_cloud::{AssetRecord, CloudError, InMemoryModelClient, ObjectStorage};
use mediadesk_db::MemoryKvStore;

fn asset(id: &str, project: &str, thumbnail: Option<&str>) -> AssetRecord {
    AssetRecord {
        id: id.to_string(),
        name: format!("Asset {id}"),
        organization_id: "org-1".to_string(),
        project_id: project.to_string(),
        storage_key: format!("originals/{id}.mov"),
        thumbnail_key: thumbnail.map(str::to_string),
        mime_type: Some("video/quicktime".to_string()),
        created_at: None,
    }
}

async fn app_with_assets(assets: Vec<AssetRecord>) -> (axum::Router, mediadesk_api::state::AppState) {
    let state = common::build_test_state(
        Arc::new(MemoryKvStore::new()),
        Arc::new(InMemoryModelClient::with_assets(assets)),
    )
    .await;
    (common::router_for(state.clone()), state)
}

/// Storage that refuses every key.
struct BrokenStorage;

#[async_trait]
impl ObjectStorage for BrokenStorage {
    async fn retrieval_url(&self, _key: &str, _ttl: Duration) -> Result<String, CloudError> {
        Err(CloudError::Presign("signing key unavailable".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Test: listing is scoped and carries thumbnail URLs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_assets_scoped_with_thumbnails() {
    let (app, _) = app_with_assets(vec![
        asset("a1", "p1", Some("thumbs/a1.jpg")),
        asset("a2", "p1", None),
        asset("a3", "p2", Some("thumbs/a3.jpg")),
    ])
    .await;

    let response = get(app, "/api/v1/assets?organization_id=org-1&project_id=p1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let assets = json["data"].as_array().unwrap();

    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0]["id"], "a1");
    assert_eq!(assets[0]["storageKey"], "originals/a1.mov");
    assert!(assets[0]["thumbnailUrl"]
        .as_str()
        .unwrap()
        .starts_with("http://localhost:3000/files/thumbs/a1.jpg?expires="));
    assert!(assets[1]["thumbnailUrl"].is_null());
}

// ---------------------------------------------------------------------------
// Test: thumbnail signing failures leave the URL empty
// ---------------------------------------------------------------------------

#[tokio::test]
async fn thumbnail_failures_do_not_fail_the_listing() {
    let (_, mut state) = app_with_assets(vec![asset("a1", "p1", Some("thumbs/a1.jpg"))]).await;
    state.storage = Arc::new(BrokenStorage);
    let app = common::router_for(state);

    let response = get(app, "/api/v1/assets?organization_id=org-1&project_id=p1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"][0]["thumbnailUrl"].is_null());
}

// ---------------------------------------------------------------------------
// Test: scope parameters are required
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_assets_requires_scope() {
    let (app, _) = app_with_assets(vec![]).await;

    let response = get(app.clone(), "/api/v1/assets?organization_id=org-1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

    let response = get(app, "/api/v1/assets?organization_id=&project_id=p1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: creating and updating asset records
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_asset_in_scope() {
    let (app, _) = app_with_assets(vec![]).await;

    let response = post_json(
        app.clone(),
        "/api/v1/assets?organization_id=org-1&project_id=p1",
        serde_json::json!({
            "name": "Trailer",
            "storageKey": "originals/trailer.mov",
            "thumbnailKey": "thumbs/trailer.jpg"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Trailer");
    assert_eq!(json["data"]["organizationId"], "org-1");
    assert_eq!(json["data"]["projectId"], "p1");
    assert!(json["data"]["thumbnailUrl"]
        .as_str()
        .unwrap()
        .starts_with("http://localhost:3000/files/thumbs/trailer.jpg"));

    let listed = body_json(get(app.clone(), "/api/v1/assets?organization_id=org-1&project_id=p1").await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    let other = body_json(get(app, "/api/v1/assets?organization_id=org-1&project_id=p2").await).await;
    assert!(other["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn create_asset_validates_input() {
    let (app, _) = app_with_assets(vec![]).await;

    let response = post_json(
        app.clone(),
        "/api/v1/assets?organization_id=org-1",
        serde_json::json!({ "name": "Trailer", "storageKey": "originals/t.mov" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        app,
        "/api/v1/assets?organization_id=org-1&project_id=p1",
        serde_json::json!({ "name": "  ", "storageKey": "originals/t.mov" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn update_asset_patches_fields() {
    let (app, _) = app_with_assets(vec![asset("a1", "p1", None)]).await;

    let response = patch_json(
        app.clone(),
        "/api/v1/assets/a1?organization_id=org-1&project_id=p1",
        serde_json::json!({ "thumbnailKey": "thumbs/a1.jpg" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Asset a1");
    assert_eq!(json["data"]["thumbnailKey"], "thumbs/a1.jpg");
    assert!(json["data"]["thumbnailUrl"].is_string());

    let response = patch_json(
        app.clone(),
        "/api/v1/assets/a1?organization_id=org-1&project_id=p1",
        serde_json::json!({ "name": "" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_asset_outside_scope_is_not_found() {
    let (app, _) = app_with_assets(vec![asset("a1", "p1", None)]).await;

    let response = patch_json(
        app.clone(),
        "/api/v1/assets/a1?organization_id=org-1&project_id=p2",
        serde_json::json!({ "name": "Moved" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    let response = patch_json(
        app,
        "/api/v1/assets/missing?organization_id=org-1&project_id=p1",
        serde_json::json!({ "name": "Moved" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: storage URLs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn storage_url_for_key() {
    let (app, _) = app_with_assets(vec![]).await;

    let response = get(app, "/api/v1/assets/url?key=originals/a1.mov").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["key"], "originals/a1.mov");
    assert_eq!(json["data"]["expires_in_secs"], 3600);
    assert!(json["data"]["url"]
        .as_str()
        .unwrap()
        .starts_with("http://localhost:3000/files/originals/a1.mov"));
}

#[tokio::test]
async fn storage_url_rejects_traversal() {
    let (app, _) = app_with_assets(vec![]).await;

    let response = get(app, "/api/v1/assets/url?key=a/../b").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn storage_failures_map_to_bad_gateway() {
    let (_, mut state) = app_with_assets(vec![]).await;
    state.storage = Arc::new(BrokenStorage);
    let app = common::router_for(state);

    let response = get(app, "/api/v1/assets/url?key=originals/a1.mov").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "UPSTREAM_ERROR");
}
