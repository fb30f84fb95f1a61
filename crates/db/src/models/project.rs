//! Project records.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cadenza_core::error::CoreError;
use cadenza_core::project::{FeedbackEntry, Project, ProjectStatus, Version};
use cadenza_core::types::{ProjectId, Timestamp};

use crate::models::feedback::CreateFeedback;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectRow {
    pub id: ProjectId,
    pub client_name: String,
    pub client_email: String,
    pub title: String,
    pub status: String,
    pub revision: i64,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub last_activity_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProjectRow {
    /// Assemble the domain aggregate from this row and its children.
    pub fn into_project(
        self,
        versions: Vec<Version>,
        feedback_history: Vec<FeedbackEntry>,
    ) -> Result<Project, CoreError> {
        Ok(Project {
            status: self.status.parse()?,
            id: self.id,
            client_name: self.client_name,
            client_email: self.client_email,
            title: self.title,
            versions,
            feedback_history,
            created_at: self.created_at,
            expires_at: self.expires_at,
            last_activity_at: self.last_activity_at,
            revision: self.revision,
        })
    }
}

/// DTO for creating or refreshing a project when previews are announced.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertProject {
    pub id: ProjectId,
    pub client_name: String,
    pub client_email: String,
    pub title: String,
    pub expires_at: Option<Timestamp>,
}

/// A checked status write: applied only while the stored revision still
/// equals `expected_revision`.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub project_id: ProjectId,
    pub expected_revision: i64,
    pub status: ProjectStatus,
    /// History entry appended in the same transaction.
    pub feedback: Option<CreateFeedback>,
}
