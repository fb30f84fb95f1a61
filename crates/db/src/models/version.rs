use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cadenza_core::project::Version;
use cadenza_core::types::{ProjectId, Timestamp};

/// A row from the `project_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VersionRow {
    pub project_id: ProjectId,
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub audio_url: String,
    pub recommended: bool,
    pub position: i32,
    pub created_at: Timestamp,
}

impl From<VersionRow> for Version {
    fn from(row: VersionRow) -> Self {
        Version {
            id: row.id,
            name: row.name,
            description: row.description,
            audio_url: row.audio_url,
            recommended: row.recommended,
        }
    }
}

/// DTO for inserting or updating a version; `position` is its list index.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertVersion {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub audio_url: String,
    pub recommended: bool,
}
