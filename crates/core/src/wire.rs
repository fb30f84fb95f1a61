//! Request and response bodies shared by the preview client and the backend.
//!
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::access::VerifyFailure;
use crate::project::{Project, ProjectStatus};
use crate::status::{FeedbackDecision, ValidationError};
use crate::types::{ProjectId, Timestamp};

/// `POST /api/v1/preview/verify`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTokenRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub preview_id: Option<ProjectId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTokenResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<VerifyFailure>,
}

impl VerifyTokenResponse {
    pub fn valid(project: Project) -> Self {
        Self {
            valid: true,
            project: Some(project),
            error: None,
            reason: None,
        }
    }

    pub fn invalid(reason: VerifyFailure) -> Self {
        Self {
            valid: false,
            project: None,
            error: Some(reason.to_string()),
            reason: Some(reason),
        }
    }
}

/// `POST /api/v1/preview/feedback`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub project_id: ProjectId,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub feedback: String,
    pub status: FeedbackDecision,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub expected_revision: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub success: bool,
    pub status: ProjectStatus,
    pub project: Project,
}

/// One version announced by the operator when previews are ready.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInput {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub audio_url: String,
    #[serde(default)]
    pub recommended: bool,
}

/// `POST /api/v1/preview/notify`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewNotificationRequest {
    pub project_id: ProjectId,
    pub client_name: String,
    pub client_email: String,
    pub project_title: String,
    #[serde(default)]
    pub versions: Vec<VersionInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewNotificationResponse {
    pub success: bool,
    pub preview_url: String,
    pub token: String,
    pub expiration_date: Timestamp,
}

/// `POST /api/v1/preview/revoke`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    pub project_id: ProjectId,
}

/// `POST /api/v1/auth/magic-link`
///
/// With a `projectId` whose client email matches, the mailed link carries
/// that project's preview token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkRequest {
    pub email: String,
    pub redirect_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Normalize and validate an email address (trimmed, lowercased).
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let normalized = email.trim().to_lowercase();
    if normalized.validate_email() {
        Ok(normalized)
    } else {
        Err(ValidationError::InvalidEmail(email.trim().to_string()))
    }
}
