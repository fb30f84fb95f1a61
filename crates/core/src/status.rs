//! Project status state machine (waiting -> feedback -> approved).
//!
//! Transition rules:
//! - `waiting`  -> `feedback` (submit feedback), `approved` (approve a version)
//! - `feedback` -> `feedback` (more feedback), `approved` (approve a version)
//! - `approved` -> nothing; resetting is an operator action outside this module
//!
//! The `check_*` functions validate preconditions without mutating anything.
//! The `apply_*` functions validate and then mutate an in-memory [`Project`];
//! the backend of record uses them to compute the state it persists.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::project::{FeedbackEntry, Project, ProjectStatus, Version};
use crate::types::Timestamp;

/// Maximum length of a feedback message (characters).
pub const MAX_FEEDBACK_LENGTH: usize = 10_000;

/// Bad or missing user input for a status transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Feedback must not be empty")]
    EmptyFeedback,

    #[error("Feedback exceeds {max} characters")]
    FeedbackTooLong { max: usize },

    #[error("No version selected")]
    NoVersionSelected,

    #[error("Version '{0}' does not belong to this project")]
    UnknownVersion(String),

    #[error("Project is already approved")]
    AlreadyApproved,

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

/// The two client actions that may change a project's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    SubmitFeedback,
    ApproveVersion,
}

impl StatusAction {
    /// Status a project lands in after the action succeeds.
    pub fn target(self) -> ProjectStatus {
        match self {
            Self::SubmitFeedback => ProjectStatus::Feedback,
            Self::ApproveVersion => ProjectStatus::Approved,
        }
    }
}

/// Decision value carried by the feedback submission endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackDecision {
    Feedback,
    Revision,
    Approved,
}

impl FeedbackDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feedback => "feedback",
            Self::Revision => "revision",
            Self::Approved => "approved",
        }
    }

    pub fn action(self) -> StatusAction {
        match self {
            Self::Feedback | Self::Revision => StatusAction::SubmitFeedback,
            Self::Approved => StatusAction::ApproveVersion,
        }
    }
}

/// Returns the set of statuses that `from` may transition to.
pub fn valid_transitions(from: ProjectStatus) -> &'static [ProjectStatus] {
    match from {
        ProjectStatus::Waiting => &[ProjectStatus::Feedback, ProjectStatus::Approved],
        ProjectStatus::Feedback => &[ProjectStatus::Feedback, ProjectStatus::Approved],
        ProjectStatus::Approved => &[],
    }
}

/// Validate that `from -> to` is an allowed transition.
pub fn validate_transition(from: ProjectStatus, to: ProjectStatus) -> Result<(), CoreError> {
    if from == ProjectStatus::Approved {
        return Err(ValidationError::AlreadyApproved.into());
    }
    if valid_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Cannot transition project from '{from}' to '{to}'"
        )))
    }
}

/// Check the preconditions of `submit_feedback`. Returns the trimmed content.
pub fn check_feedback<'a>(
    project: &Project,
    content: &'a str,
    version_id: Option<&str>,
) -> Result<&'a str, ValidationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyFeedback);
    }
    if content.chars().count() > MAX_FEEDBACK_LENGTH {
        return Err(ValidationError::FeedbackTooLong {
            max: MAX_FEEDBACK_LENGTH,
        });
    }
    if project.status == ProjectStatus::Approved {
        return Err(ValidationError::AlreadyApproved);
    }
    if let Some(version_id) = version_id {
        if project.find_version(version_id).is_none() {
            return Err(ValidationError::UnknownVersion(version_id.to_string()));
        }
    }
    Ok(content)
}

/// Check the preconditions of `approve_version`. Returns the selected version.
pub fn check_approval<'p>(
    project: &'p Project,
    version_id: Option<&str>,
) -> Result<&'p Version, ValidationError> {
    let version_id = version_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ValidationError::NoVersionSelected)?;
    if project.status == ProjectStatus::Approved {
        return Err(ValidationError::AlreadyApproved);
    }
    project
        .find_version(version_id)
        .ok_or_else(|| ValidationError::UnknownVersion(version_id.to_string()))
}

/// Validate and record feedback: appends `entry`, moves to `feedback`.
pub fn apply_feedback(
    project: &mut Project,
    mut entry: FeedbackEntry,
    now: Timestamp,
) -> Result<(), ValidationError> {
    let content = check_feedback(project, &entry.content, entry.version_id.as_deref())?;
    entry.content = content.to_string();
    project.feedback_history.push(entry);
    project.status = StatusAction::SubmitFeedback.target();
    project.last_activity_at = now;
    project.revision += 1;
    Ok(())
}

/// Validate and record an approval of `version_id`.
pub fn apply_approval(
    project: &mut Project,
    version_id: &str,
    now: Timestamp,
) -> Result<(), ValidationError> {
    check_approval(project, Some(version_id))?;
    project.status = StatusAction::ApproveVersion.target();
    project.last_activity_at = now;
    project.revision += 1;
    Ok(())
}
