#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

use cadenza_api::auth::jwt::{generate_access_token, JwtConfig, ROLE_OPERATOR};
use cadenza_api::config::{PreviewTokenConfig, ServerConfig};
use cadenza_api::router::build_app_router;
use cadenza_api::state::AppState;
use cadenza_events::{Notifier, WebhookConfig};

pub const SITE_URL: &str = "http://localhost:5173";

/// Build a test `ServerConfig` with safe defaults: no webhook, no email,
/// unsigned preview tokens.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![SITE_URL.to_string()],
        request_timeout_secs: 30,
        public_site_url: SITE_URL.to_string(),
        preview: PreviewTokenConfig::default(),
        jwt: JwtConfig {
            secret: "test-jwt-secret-for-integration".to_string(),
            access_token_expiry_mins: 15,
        },
        webhook: WebhookConfig::default(),
        email: None,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState::new(pool, config.clone(), Notifier::disabled());
    build_app_router(state, &config)
}

/// A pool that never connects unless a handler touches the database.
/// Acquiring fails fast so health checks report a degraded service.
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy("postgres://cadenza@127.0.0.1:1/unused")
        .expect("lazy pool")
}

pub fn operator_token(role: &str) -> String {
    generate_access_token("ops@cadenza.test", role, &test_config().jwt).expect("token")
}

pub fn operator_bearer() -> String {
    format!("Bearer {}", operator_token(ROLE_OPERATOR))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    bearer: Option<&str>,
) -> Response<Body> {
    let mut request = Request::post(uri).header("content-type", "application/json");
    if let Some(bearer) = bearer {
        request = request.header("authorization", bearer);
    }
    app.oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
