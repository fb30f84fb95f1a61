//! Router behaviour that does not reach the database: input checks,
//! operator authentication, unconfigured services and middleware.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{body_json, get, lazy_pool, operator_bearer, operator_token, post_json};

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app(lazy_pool());
    let response = get(app, "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let app = common::build_test_app(lazy_pool());
    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert_eq!(json["email_enabled"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = common::build_test_app(lazy_pool());
    let response = get(app, "/this-route-does-not-exist").await;
    assert!(response.headers().contains_key("x-request-id"));
}

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

#[tokio::test]
async fn verify_without_fields_is_400() {
    let app = common::build_test_app(lazy_pool());
    let response = post_json(app, "/api/v1/preview/verify", json!({}), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["valid"], false);
    assert_eq!(json["reason"], "missing_fields");
}

#[tokio::test]
async fn verify_with_blank_token_is_400() {
    let app = common::build_test_app(lazy_pool());
    let body = json!({ "token": "  ", "previewId": "P123" });
    let response = post_json(app, "/api/v1/preview/verify", body, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_with_undecodable_token_is_401() {
    let app = common::build_test_app(lazy_pool());
    let body = json!({ "token": "not*base64", "previewId": "P123" });
    let response = post_json(app, "/api/v1/preview/verify", body, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["reason"], "expired");
    assert_eq!(json["error"], "Invalid or expired token");
    assert!(json.get("project").is_none());
}

#[tokio::test]
async fn unsigned_token_is_401_when_signing_is_configured() {
    let mut config = common::test_config();
    config.preview.secret = Some("preview-secret".into());
    let app = common::build_test_app_with(lazy_pool(), config);

    let body = json!({ "token": cadenza_core::token::issue("P123"), "previewId": "P123" });
    let response = post_json(app, "/api/v1/preview/verify", body, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Project reads and feedback input checks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn project_id_with_delimiter_is_rejected() {
    let app = common::build_test_app(lazy_pool());
    let response = get(app, "/api/v1/preview/projects/P1:2").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn feedback_without_token_is_401() {
    for token in [json!(null), json!("   ")] {
        let app = common::build_test_app(lazy_pool());
        let body = json!({
            "projectId": "P123",
            "feedback": "",
            "status": "approved",
            "versionId": "v1",
            "token": token
        });
        let response = post_json(app, "/api/v1/preview/feedback", body, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn feedback_with_unknown_decision_is_rejected() {
    let app = common::build_test_app(lazy_pool());
    let body = json!({ "projectId": "P123", "feedback": "oi", "status": "maybe" });
    let response = post_json(app, "/api/v1/preview/feedback", body, None).await;
    assert!(response.status().is_client_error());
}

// ---------------------------------------------------------------------------
// Operator endpoints
// ---------------------------------------------------------------------------

fn notification_body() -> serde_json::Value {
    json!({
        "projectId": "P123",
        "clientName": "Ana Souza",
        "clientEmail": "ana@example.com",
        "projectTitle": "Música de aniversário",
        "versions": [
            { "id": "v1", "name": "Versão 1", "audioUrl": "https://cdn.cadenza.test/v1.mp3" }
        ]
    })
}

#[tokio::test]
async fn notify_requires_bearer_token() {
    let app = common::build_test_app(lazy_pool());
    let response = post_json(app, "/api/v1/preview/notify", notification_body(), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn notify_rejects_garbage_bearer() {
    let app = common::build_test_app(lazy_pool());
    let response = post_json(
        app,
        "/api/v1/preview/notify",
        notification_body(),
        Some("Bearer not-a-jwt"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoke_requires_operator_role() {
    let app = common::build_test_app(lazy_pool());
    let bearer = format!("Bearer {}", operator_token("client"));
    let response = post_json(
        app,
        "/api/v1/preview/revoke",
        json!({ "projectId": "P123" }),
        Some(&bearer),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn notify_validates_before_touching_the_database() {
    let app = common::build_test_app(lazy_pool());
    let mut body = notification_body();
    body["clientEmail"] = json!("not-an-email");
    let response = post_json(
        app,
        "/api/v1/preview/notify",
        body,
        Some(&operator_bearer()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Magic link
// ---------------------------------------------------------------------------

#[tokio::test]
async fn magic_link_without_email_delivery_is_503() {
    let app = common::build_test_app(lazy_pool());
    let body = json!({
        "email": "ana@example.com",
        "redirectTo": "http://localhost:5173/preview/P123"
    });
    let response = post_json(app, "/api/v1/auth/magic-link", body, None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn magic_link_with_invalid_email_is_400() {
    let app = common::build_test_app(lazy_pool());
    let body = json!({
        "email": "ana-at-example",
        "redirectTo": "http://localhost:5173/preview/P123"
    });
    let response = post_json(app, "/api/v1/auth/magic-link", body, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn magic_link_with_bad_project_id_is_400() {
    let app = common::build_test_app(lazy_pool());
    let body = json!({
        "email": "ana@example.com",
        "redirectTo": "http://localhost:5173/preview/P123",
        "projectId": "P1:2"
    });
    let response = post_json(app, "/api/v1/auth/magic-link", body, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn magic_link_to_foreign_site_is_400() {
    let app = common::build_test_app(lazy_pool());
    let body = json!({
        "email": "ana@example.com",
        "redirectTo": "https://phish.example.net/preview/P123"
    });
    let response = post_json(app, "/api/v1/auth/magic-link", body, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
