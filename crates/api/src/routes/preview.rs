use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{feedback, preview};
use crate::state::AppState;

/// Routes mounted at `/api/v1/preview`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verify", post(preview::verify))
        .route("/projects/{id}", get(preview::get_project))
        .route("/feedback", post(feedback::submit))
        .route("/notify", post(preview::notify))
        .route("/revoke", post(preview::revoke))
}
