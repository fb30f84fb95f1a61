use serde::Serialize;
use sqlx::FromRow;

use cadenza_core::types::{DbId, ProjectId, Timestamp};

/// A row from the `preview_codes` table: one issued preview token.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PreviewCode {
    pub id: DbId,
    pub code: String,
    pub project_id: ProjectId,
    pub is_active: bool,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

impl PreviewCode {
    /// Active and not yet expired at `now`.
    pub fn is_usable_at(&self, now: Timestamp) -> bool {
        self.is_active && self.expires_at > now
    }
}
