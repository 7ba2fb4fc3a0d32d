//! Integration tests for the delivery job endpoints.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, get, post, post_json};
use serde_json::json;

async fn create_job(app: &axum::Router, body: serde_json::Value) -> serde_json::Value {
    let response = post_json(app.clone(), "/api/v1/delivery/jobs", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Test: creating a job without a preset uses the first preset
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn create_job_uses_first_preset() {
    let app = common::build_test_app().await;
    let job = create_job(&app, json!({ "asset_name": "Launch teaser" })).await;

    assert_eq!(job["status"], "queued");
    assert_eq!(job["progress"], 0);
    assert_eq!(job["asset_name"], "Launch teaser");
    assert_eq!(job["preset_name"], "Social Media Blast");
    assert_eq!(job["retry_count"], 0);
    assert!(job["asset_id"].as_str().unwrap().starts_with("asset-"));

    let destinations = job["destinations"].as_array().unwrap();
    assert_eq!(destinations.len(), 2);
    assert!(destinations
        .iter()
        .all(|d| d["status"] == "pending" && d["progress"] == 0));
}

// ---------------------------------------------------------------------------
// Test: an unknown preset id is rejected
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn create_job_with_unknown_preset_returns_404() {
    let app = common::build_test_app().await;
    let response = post_json(
        app,
        "/api/v1/delivery/jobs",
        json!({ "preset_id": uuid::Uuid::new_v4() }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Test: get by id, unknown id and malformed id
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn get_job_by_id() {
    let app = common::build_test_app().await;
    let job = create_job(&app, json!({})).await;
    let id = job["id"].as_str().unwrap();

    let response = get(app.clone(), &format!("/api/v1/delivery/jobs/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], id);

    let missing = get(
        app.clone(),
        &format!("/api/v1/delivery/jobs/{}", uuid::Uuid::new_v4()),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let malformed = get(app, "/api/v1/delivery/jobs/not-a-uuid").await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: listing is newest first and filters by status
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn list_jobs_newest_first_with_status_filter() {
    let app = common::build_test_app().await;
    let first = create_job(&app, json!({ "asset_name": "First" })).await;
    let second = create_job(&app, json!({ "asset_name": "Second" })).await;

    let id = first["id"].as_str().unwrap();
    let cancelled = post(app.clone(), &format!("/api/v1/delivery/jobs/{id}/cancel")).await;
    assert_eq!(cancelled.status(), StatusCode::OK);

    let all = body_json(get(app.clone(), "/api/v1/delivery/jobs").await).await;
    let all = all["data"].as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["id"], second["id"]);

    let only_cancelled =
        body_json(get(app.clone(), "/api/v1/delivery/jobs?status=cancelled").await).await;
    let only_cancelled = only_cancelled["data"].as_array().unwrap();
    assert_eq!(only_cancelled.len(), 1);
    assert_eq!(only_cancelled[0]["id"], first["id"]);

    let paged = body_json(get(app, "/api/v1/delivery/jobs?limit=1&offset=1").await).await;
    assert_eq!(paged["data"][0]["id"], first["id"]);
}

#[tokio::test(start_paused = true)]
async fn list_jobs_rejects_unknown_status() {
    let app = common::build_test_app().await;

    let response = get(app.clone(), "/api/v1/delivery/jobs?status=paused").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = get(app, "/api/v1/delivery/jobs?status=").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Test: a job runs to completion and stops changing
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn job_runs_to_completion() {
    let app = common::build_test_app().await;
    let job = create_job(&app, json!({})).await;
    let uri = format!("/api/v1/delivery/jobs/{}", job["id"].as_str().unwrap());

    tokio::time::sleep(Duration::from_millis(600)).await;
    let started = body_json(get(app.clone(), &uri).await).await["data"].clone();
    assert_eq!(started["status"], "processing");
    assert!(started["started_at"].is_string());

    tokio::time::sleep(Duration::from_secs(20)).await;
    let done = body_json(get(app.clone(), &uri).await).await["data"].clone();
    assert_eq!(done["status"], "completed");
    assert_eq!(done["progress"], 100);
    assert!(done["completed_at"].is_string());
    for destination in done["destinations"].as_array().unwrap() {
        assert_eq!(destination["status"], "completed");
        assert_eq!(destination["progress"], 100);
        assert!(destination["url"].is_string());
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    let later = body_json(get(app, &uri).await).await["data"].clone();
    assert_eq!(later, done);
}

// ---------------------------------------------------------------------------
// Test: cancel is rejected while processing and final once applied
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cancel_rules() {
    let app = common::build_test_app().await;
    let job = create_job(&app, json!({})).await;
    let id = job["id"].as_str().unwrap();

    tokio::time::sleep(Duration::from_millis(600)).await;
    let response = post(app.clone(), &format!("/api/v1/delivery/jobs/{id}/cancel")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");

    // Past the processing threshold the job is delivering and cancellable.
    tokio::time::sleep(Duration::from_secs(3)).await;
    let response = post(app.clone(), &format!("/api/v1/delivery/jobs/{id}/cancel")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled = body_json(response).await["data"].clone();
    assert_eq!(cancelled["status"], "cancelled");

    tokio::time::sleep(Duration::from_secs(20)).await;
    let frozen = body_json(get(app.clone(), &format!("/api/v1/delivery/jobs/{id}")).await).await;
    assert_eq!(frozen["data"], cancelled);

    let again = post(app, &format!("/api/v1/delivery/jobs/{id}/cancel")).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Test: fail then retry replays the job
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn fail_then_retry_replays_job() {
    let app = common::build_test_app().await;
    let job = create_job(&app, json!({})).await;
    let id = job["id"].as_str().unwrap();

    // Retry is only valid from failed.
    let early = post(app.clone(), &format!("/api/v1/delivery/jobs/{id}/retry")).await;
    assert_eq!(early.status(), StatusCode::CONFLICT);

    tokio::time::sleep(Duration::from_secs(3)).await;
    let response = post_json(
        app.clone(),
        &format!("/api/v1/delivery/jobs/{id}/fail"),
        json!({ "reason": "Upload quota exceeded" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let failed = body_json(response).await["data"].clone();
    assert_eq!(failed["status"], "failed");
    assert_eq!(failed["error"], "Upload quota exceeded");

    let response = post(app.clone(), &format!("/api/v1/delivery/jobs/{id}/retry")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let retried = body_json(response).await["data"].clone();
    assert_eq!(retried["status"], "queued");
    assert_eq!(retried["retry_count"], 1);
    assert_eq!(retried["progress"], 0);
    assert!(retried.get("error").is_none());
    assert!(retried.get("started_at").is_none());

    tokio::time::sleep(Duration::from_secs(20)).await;
    let done = body_json(get(app, &format!("/api/v1/delivery/jobs/{id}")).await).await;
    assert_eq!(done["data"]["status"], "completed");
    assert_eq!(done["data"]["retry_count"], 1);
}

// ---------------------------------------------------------------------------
// Test: failing without a reason uses the generic message
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn fail_without_reason_uses_generic_message() {
    let app = common::build_test_app().await;
    let job = create_job(&app, json!({})).await;
    let id = job["id"].as_str().unwrap();

    let response = post(app.clone(), &format!("/api/v1/delivery/jobs/{id}/fail")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let failed = body_json(response).await["data"].clone();
    assert_eq!(failed["error"], "Delivery failed");
    assert!(failed["destinations"]
        .as_array()
        .unwrap()
        .iter()
        .all(|d| d["status"] == "failed"));

    let twice = post(app, &format!("/api/v1/delivery/jobs/{id}/fail")).await;
    assert_eq!(twice.status(), StatusCode::CONFLICT);
}
