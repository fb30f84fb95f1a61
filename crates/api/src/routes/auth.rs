use axum::routing::post;
use axum::Router;

use crate::handlers::magic_link;
use crate::state::AppState;

/// Routes mounted at `/api/v1/auth`.
pub fn router() -> Router<AppState> {
    Router::new().route("/magic-link", post(magic_link::send))
}
