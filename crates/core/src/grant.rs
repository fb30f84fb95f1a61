//! Access grants held by the client after authenticating for a project.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::{ProjectId, Timestamp};

/// Default lifetime of a client-side access grant.
pub const DEFAULT_GRANT_TTL_DAYS: i64 = 14;

/// Default lifetime of a backend preview code.
pub const DEFAULT_PREVIEW_CODE_TTL_DAYS: i64 = 7;

/// A client's permission to view one project's previews.
///
/// The expiry is fixed when the grant is written and never extended by reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub project_id: ProjectId,
    pub email: Option<String>,
    pub granted_at: Timestamp,
    pub expires_at: Timestamp,
}

impl AccessGrant {
    /// Create a grant starting at `granted_at` and lasting `ttl`.
    pub fn new(
        project_id: impl Into<ProjectId>,
        email: Option<String>,
        granted_at: Timestamp,
        ttl: Duration,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            email,
            granted_at,
            expires_at: granted_at + ttl,
        }
    }

    /// A grant whose expiry is at or before `now` is treated as absent.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}
