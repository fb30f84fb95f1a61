//! Handler for client feedback and approvals.
//!
//! The backend is the single source of truth for status transitions: the
//! same checks the client runs before submitting are repeated here against
//! the stored project, and the write is guarded by the project revision.

use axum::extract::State;
use axum::Json;

use cadenza_core::access::{AccessMethod, VerifyFailure};
use cadenza_core::error::CoreError;
use cadenza_core::project::validate_project_id;
use cadenza_core::status::{check_approval, check_feedback, StatusAction};
use cadenza_core::wire::{FeedbackRequest, FeedbackResponse};
use cadenza_db::models::feedback::CreateFeedback;
use cadenza_db::models::project::StatusUpdate;
use cadenza_db::repositories::ProjectRepo;
use cadenza_events::event::{PREVIEW_APPROVED, PREVIEW_FEEDBACK};
use cadenza_events::PreviewEvent;

use crate::error::{AppError, AppResult};
use crate::handlers::preview::{check_preview_token, log_access};
use crate::state::AppState;

fn stale_revision(project_id: &str) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Project {project_id} changed since it was loaded"
    )))
}

/// POST /api/v1/preview/feedback
pub async fn submit(
    State(state): State<AppState>,
    Json(input): Json<FeedbackRequest>,
) -> AppResult<Json<FeedbackResponse>> {
    validate_project_id(&input.project_id)?;
    let project_id = input.project_id.as_str();

    // Mutations need a backend-verified preview token, never just an email.
    let token = input
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CoreError::Unauthorized("A preview token is required".into()))?;

    let project = ProjectRepo::load(&state.pool, project_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Project",
            id: project_id.to_string(),
        })?;

    check_preview_token(&state, token, project_id)
        .await
        .map_err(|failure| match failure {
            VerifyFailure::BackendError => AppError::InternalError("Preview code lookup failed".into()),
            other => AppError::Core(CoreError::Unauthorized(other.to_string())),
        })?;

    if let Some(expected) = input.expected_revision {
        if expected != project.revision {
            return Err(stale_revision(project_id));
        }
    }

    let version_id = input.version_id.as_deref();
    let action = input.status.action();
    let history_entry = match action {
        StatusAction::SubmitFeedback => {
            let content = check_feedback(&project, &input.feedback, version_id)?;
            Some(CreateFeedback {
                project_id: project.id.clone(),
                content: content.to_string(),
                version_id: version_id.map(str::to_string),
                decision: input.status.as_str().to_string(),
                client_name: input.client_name.clone(),
                client_email: input.client_email.clone(),
            })
        }
        StatusAction::ApproveVersion => {
            check_approval(&project, version_id)?;
            None
        }
    };

    let update = StatusUpdate {
        project_id: project.id.clone(),
        expected_revision: project.revision,
        status: action.target(),
        feedback: history_entry,
    };
    if ProjectRepo::apply_status_update(&state.pool, &update)
        .await?
        .is_none()
    {
        return Err(stale_revision(project_id));
    }

    log_access(
        &state,
        project_id,
        AccessMethod::Feedback,
        input.client_email.clone(),
    )
    .await;

    let updated = ProjectRepo::load(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Project {project_id} vanished after update")))?;

    let event_type = match action {
        StatusAction::SubmitFeedback => PREVIEW_FEEDBACK,
        StatusAction::ApproveVersion => PREVIEW_APPROVED,
    };
    state.notifier.publish(
        PreviewEvent::new(event_type, project_id).with_payload(serde_json::json!({
            "decision": input.status.as_str(),
            "versionId": input.version_id,
            "clientName": input.client_name,
            "clientEmail": input.client_email,
            "feedback": input.feedback.trim(),
        })),
    );

    tracing::info!(
        project_id,
        decision = input.status.as_str(),
        revision = updated.revision,
        "Client decision recorded"
    );

    Ok(Json(FeedbackResponse {
        success: true,
        status: updated.status,
        project: updated,
    }))
}
