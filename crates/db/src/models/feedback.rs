//! Feedback history entries.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cadenza_core::error::CoreError;
use cadenza_core::project::FeedbackEntry;
use cadenza_core::types::{DbId, ProjectId, Timestamp};

/// A row from the `feedback_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FeedbackRow {
    pub id: DbId,
    pub project_id: ProjectId,
    pub content: String,
    pub version_id: Option<String>,
    /// `feedback`, `revision` or `approved`, as submitted by the client.
    pub decision: String,
    pub status: String,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub created_at: Timestamp,
}

impl TryFrom<FeedbackRow> for FeedbackEntry {
    type Error = CoreError;

    fn try_from(row: FeedbackRow) -> Result<Self, Self::Error> {
        Ok(FeedbackEntry {
            id: row.id,
            content: row.content,
            version_id: row.version_id,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

/// DTO for appending a feedback entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFeedback {
    pub project_id: ProjectId,
    pub content: String,
    pub version_id: Option<String>,
    pub decision: String,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
}
