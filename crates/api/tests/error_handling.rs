//! Tests for `AppError` -> HTTP response mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;

use cadenza_api::error::AppError;
use cadenza_core::error::CoreError;
use cadenza_core::status::ValidationError;

async fn error_parts(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn not_found_maps_to_404() {
    let (status, json) = error_parts(AppError::Core(CoreError::NotFound {
        entity: "Project",
        id: "P123".into(),
    }))
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Project with id P123 not found");
}

#[tokio::test]
async fn validation_error_maps_to_400() {
    let (status, json) = error_parts(ValidationError::NoVersionSelected.into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "No version selected");
}

#[tokio::test]
async fn conflict_maps_to_409() {
    let (status, json) =
        error_parts(AppError::Core(CoreError::Conflict("stale revision".into()))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn unauthorized_and_forbidden() {
    let (status, _) =
        error_parts(AppError::Core(CoreError::Unauthorized("no token".into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) =
        error_parts(AppError::Core(CoreError::Forbidden("operators only".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn service_unavailable_maps_to_503() {
    let (status, json) =
        error_parts(AppError::ServiceUnavailable("Email delivery is not configured".into())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(json["error"], "Email delivery is not configured");
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    let (status, json) = error_parts(AppError::InternalError("pool exhausted".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");

    let (status, json) = error_parts(AppError::Database(sqlx::Error::PoolTimedOut)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn row_not_found_maps_to_404() {
    let (status, _) = error_parts(AppError::Database(sqlx::Error::RowNotFound)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
