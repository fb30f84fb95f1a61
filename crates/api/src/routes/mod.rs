pub mod auth;
pub mod health;
pub mod preview;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /preview/verify              verify a preview token (public)
/// /preview/projects/{id}       read a project (public)
/// /preview/feedback            feedback or approval (public, preview token required)
/// /preview/notify              publish a preview round (operator)
/// /preview/revoke              revoke preview codes (operator)
/// /auth/magic-link             mail a sign-in link (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/preview", preview::router())
        .nest("/auth", auth::router())
}
