//! Handlers for preview access: token verification, project reads,
//! publishing a preview round and revoking its codes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};

use cadenza_core::access::{AccessMethod, VerifyFailure};
use cadenza_core::error::CoreError;
use cadenza_core::project::{validate_project_id, Project};
use cadenza_core::wire::{
    normalize_email, PreviewNotificationRequest, PreviewNotificationResponse, RevokeRequest,
    SuccessResponse, VerifyTokenRequest, VerifyTokenResponse,
};
use cadenza_db::models::access_log::CreateAccessLog;
use cadenza_db::models::project::UpsertProject;
use cadenza_db::models::version::UpsertVersion;
use cadenza_db::repositories::{AccessLogRepo, PreviewCodeRepo, ProjectRepo};
use cadenza_events::event::PREVIEW_NOTIFIED;
use cadenza_events::PreviewEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::OperatorUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Token checks
// ---------------------------------------------------------------------------

/// Check `token` against the codec and the stored preview code of
/// `project_id`. Every token problem collapses into
/// [`VerifyFailure::Expired`].
pub(crate) async fn check_preview_token(
    state: &AppState,
    token: &str,
    project_id: &str,
) -> Result<(), VerifyFailure> {
    let claims = state.codec.decode(token).map_err(|e| {
        tracing::debug!(project_id, error = %e, "Preview token rejected");
        VerifyFailure::Expired
    })?;
    if claims.project_id != project_id {
        tracing::debug!(project_id, token_project = %claims.project_id, "Preview token for another project");
        return Err(VerifyFailure::Expired);
    }

    let code = PreviewCodeRepo::find_by_code(&state.pool, token.trim())
        .await
        .map_err(|e| {
            tracing::error!(project_id, error = %e, "Preview code lookup failed");
            VerifyFailure::BackendError
        })?;

    match code {
        Some(code) if code.project_id == project_id && code.is_usable_at(Utc::now()) => Ok(()),
        _ => Err(VerifyFailure::Expired),
    }
}

/// Append an access-log row. Audit only; a failed insert is logged and ignored.
pub(crate) async fn log_access(
    state: &AppState,
    project_id: &str,
    method: AccessMethod,
    email: Option<String>,
) {
    let input = CreateAccessLog {
        project_id: project_id.to_string(),
        method: method.as_str().to_string(),
        email,
    };
    if let Err(e) = AccessLogRepo::create(&state.pool, &input).await {
        tracing::warn!(project_id, method = %method, error = %e, "Access log not written");
    }
}

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

/// POST /api/v1/preview/verify
///
/// Answers with the documented status codes and a `{valid, project?,
/// error?, reason?}` body in every case, including failures.
pub async fn verify(
    State(state): State<AppState>,
    Json(input): Json<VerifyTokenRequest>,
) -> (StatusCode, Json<VerifyTokenResponse>) {
    match verify_inner(&state, &input).await {
        Ok(project) => (StatusCode::OK, Json(VerifyTokenResponse::valid(project))),
        Err(reason) => {
            let status = StatusCode::from_u16(reason.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(VerifyTokenResponse::invalid(reason)))
        }
    }
}

async fn verify_inner(state: &AppState, input: &VerifyTokenRequest) -> Result<Project, VerifyFailure> {
    let token = input.token.as_deref().map(str::trim).unwrap_or_default();
    let project_id = input.preview_id.as_deref().map(str::trim).unwrap_or_default();
    if token.is_empty() || project_id.is_empty() {
        return Err(VerifyFailure::MissingFields);
    }

    if state.codec.decode(token).is_err() {
        return Err(VerifyFailure::Expired);
    }

    let project = ProjectRepo::load(&state.pool, project_id)
        .await
        .map_err(|e| {
            tracing::error!(project_id, error = %e, "Project lookup failed");
            VerifyFailure::BackendError
        })?
        .ok_or(VerifyFailure::NotFound)?;

    check_preview_token(state, token, project_id).await?;

    log_access(
        state,
        project_id,
        AccessMethod::Token,
        Some(project.client_email.clone()),
    )
    .await;
    tracing::info!(project_id, "Preview token verified");
    Ok(project)
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/v1/preview/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    validate_project_id(&id)?;
    let project = ProjectRepo::load(&state.pool, &id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Project",
            id: id.clone(),
        })?;
    Ok(Json(DataResponse { data: project }))
}

// ---------------------------------------------------------------------------
// Notify
// ---------------------------------------------------------------------------

/// POST /api/v1/preview/notify
///
/// Publishes a preview round: upserts the project and its versions, mints
/// a fresh preview code (older ones stop working), and tells the client.
pub async fn notify(
    State(state): State<AppState>,
    operator: OperatorUser,
    Json(input): Json<PreviewNotificationRequest>,
) -> AppResult<impl IntoResponse> {
    validate_project_id(&input.project_id)?;
    let client_email = normalize_email(&input.client_email)?;
    if input.client_name.trim().is_empty() {
        return Err(AppError::BadRequest("clientName must not be empty".into()));
    }
    if input.project_title.trim().is_empty() {
        return Err(AppError::BadRequest("projectTitle must not be empty".into()));
    }
    if input.versions.iter().any(|v| v.id.trim().is_empty() || v.audio_url.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "Every version needs an id and an audioUrl".into(),
        ));
    }

    let now = Utc::now();
    let expiration_date = now + Duration::days(state.config.preview.code_ttl_days);

    let project = UpsertProject {
        id: input.project_id.clone(),
        client_name: input.client_name.trim().to_string(),
        client_email: client_email.clone(),
        title: input.project_title.trim().to_string(),
        expires_at: Some(expiration_date),
    };
    let versions: Vec<UpsertVersion> = input
        .versions
        .iter()
        .map(|v| UpsertVersion {
            id: v.id.trim().to_string(),
            name: v.name.clone(),
            description: v.description.clone(),
            audio_url: v.audio_url.trim().to_string(),
            recommended: v.recommended,
        })
        .collect();
    ProjectRepo::upsert_with_versions(&state.pool, &project, &versions).await?;

    let token = state.codec.issue_at(&input.project_id, now);
    PreviewCodeRepo::issue(&state.pool, &input.project_id, &token, expiration_date).await?;
    log_access(
        &state,
        &input.project_id,
        AccessMethod::Notification,
        Some(client_email.clone()),
    )
    .await;

    let preview_url = state.config.preview_url(&input.project_id, &token);

    if let Some(email) = state.notifier.email() {
        if let Err(e) = email
            .send_preview_ready(
                &client_email,
                &project.client_name,
                &project.title,
                &preview_url,
                expiration_date,
            )
            .await
        {
            tracing::warn!(project_id = %input.project_id, error = %e, "Preview-ready email not sent");
        }
    }

    state.notifier.publish(
        PreviewEvent::new(PREVIEW_NOTIFIED, input.project_id.clone()).with_payload(
            serde_json::json!({
                "previewUrl": preview_url,
                "expirationDate": expiration_date,
                "versions": versions.len(),
            }),
        ),
    );

    tracing::info!(
        project_id = %input.project_id,
        operator = %operator.subject,
        versions = versions.len(),
        "Preview round published"
    );

    Ok(Json(PreviewNotificationResponse {
        success: true,
        preview_url,
        token,
        expiration_date,
    }))
}

// ---------------------------------------------------------------------------
// Revoke
// ---------------------------------------------------------------------------

/// POST /api/v1/preview/revoke
pub async fn revoke(
    State(state): State<AppState>,
    operator: OperatorUser,
    Json(input): Json<RevokeRequest>,
) -> AppResult<impl IntoResponse> {
    validate_project_id(&input.project_id)?;
    let revoked = PreviewCodeRepo::deactivate_for_project(&state.pool, &input.project_id).await?;
    tracing::info!(
        project_id = %input.project_id,
        operator = %operator.subject,
        revoked,
        "Preview codes revoked"
    );
    Ok(Json(SuccessResponse { success: true }))
}
