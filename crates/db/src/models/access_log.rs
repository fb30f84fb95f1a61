use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cadenza_core::types::{DbId, ProjectId, Timestamp};

/// A row from the `access_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccessLog {
    pub id: DbId,
    pub project_id: ProjectId,
    pub method: String,
    pub email: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccessLog {
    pub project_id: ProjectId,
    pub method: String,
    pub email: Option<String>,
}
