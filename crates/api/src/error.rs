use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mediadesk_cloud::CloudError;
use mediadesk_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`CloudError`] for failures of
/// the storage and data model collaborators. Implements [`IntoResponse`] to
/// produce consistent `{ "error", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An error from object storage or the data model service.
    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION", core.to_string())
                }
            },

            AppError::Cloud(cloud) => classify_cloud_error(cloud),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a collaborator error into an HTTP status, error code, and message.
///
/// - Bad keys map to 400 and missing records to 404.
/// - Upstream failures map to 502 with a sanitized message.
/// - Local configuration problems map to 500.
fn classify_cloud_error(err: &CloudError) -> (StatusCode, &'static str, String) {
    match err {
        CloudError::InvalidKey(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CloudError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{what} not found"),
        ),
        CloudError::Config(msg) => {
            tracing::error!(error = %msg, "Cloud configuration error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Upstream service error");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "An upstream service request failed".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let id = uuid::Uuid::new_v4();
        let cases = [
            (
                AppError::Core(CoreError::NotFound { entity: "DeliveryJob", id }),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Core(CoreError::Validation("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Core(CoreError::InvalidTransition {
                    action: "retry",
                    status: "queued",
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Cloud(CloudError::Config("missing region".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Cloud(CloudError::GraphQl("Unauthorized".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::Cloud(CloudError::InvalidKey("../etc".into())),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
