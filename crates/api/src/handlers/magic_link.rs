use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};

use cadenza_core::project::validate_project_id;
use cadenza_core::token::link_with_token;
use cadenza_core::wire::{normalize_email, MagicLinkRequest, SuccessResponse};
use cadenza_db::repositories::{PreviewCodeRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/v1/auth/magic-link
///
/// Mails `redirectTo` to the address. The link must point at the public
/// site. When `projectId` is given and the address is that project's client,
/// the link carries the project's preview token. 503 when email is not
/// configured.
pub async fn send(
    State(state): State<AppState>,
    Json(input): Json<MagicLinkRequest>,
) -> AppResult<Json<SuccessResponse>> {
    let email = normalize_email(&input.email)?;
    let redirect_to = input.redirect_to.trim();
    if !redirect_to.starts_with(&format!("{}/", state.config.public_site_url)) {
        return Err(AppError::BadRequest(
            "redirectTo must point at the preview site".into(),
        ));
    }
    let project_id = input
        .project_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    if let Some(project_id) = project_id {
        validate_project_id(project_id)?;
    }

    let mailer = state
        .notifier
        .email()
        .ok_or_else(|| AppError::ServiceUnavailable("Email delivery is not configured".into()))?;

    let link = match project_id {
        Some(project_id) => client_link(&state, project_id, &email, redirect_to).await?,
        None => redirect_to.to_string(),
    };

    mailer
        .send_magic_link(&email, &link)
        .await
        .map_err(|e| AppError::InternalError(format!("Magic link not sent: {e}")))?;

    tracing::info!(
        redirect_to,
        with_token = link.len() != redirect_to.len(),
        "Magic link sent"
    );
    Ok(Json(SuccessResponse { success: true }))
}

/// `redirect_to`, plus the preview token of `project_id` when `email` is its
/// client. Reuses the usable code, minting one only when none is left.
///
/// Any other address gets the bare page; the response never tells the two
/// cases apart.
pub async fn client_link(
    state: &AppState,
    project_id: &str,
    email: &str,
    redirect_to: &str,
) -> AppResult<String> {
    let is_client = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .is_some_and(|p| p.client_email.eq_ignore_ascii_case(email));
    if !is_client {
        return Ok(redirect_to.to_string());
    }

    let now = Utc::now();
    let token = match PreviewCodeRepo::find_usable_for_project(&state.pool, project_id, now).await? {
        Some(code) => code.code,
        None => {
            let token = state.codec.issue_at(project_id, now);
            let expires_at = now + Duration::days(state.config.preview.code_ttl_days);
            PreviewCodeRepo::issue(&state.pool, project_id, &token, expires_at).await?;
            tracing::info!(project_id, "Preview code minted for magic link");
            token
        }
    };
    Ok(link_with_token(redirect_to, &token))
}
