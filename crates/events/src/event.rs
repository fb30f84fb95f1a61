use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cadenza_core::types::ProjectId;

/// Client left feedback or asked for a revision.
pub const PREVIEW_FEEDBACK: &str = "preview.feedback";
/// Client approved a version.
pub const PREVIEW_APPROVED: &str = "preview.approved";
/// Operator announced new previews and a preview code was minted.
pub const PREVIEW_NOTIFIED: &str = "preview.notified";

/// Something that happened to a project's preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewEvent {
    /// Dot-separated event name, e.g. `"preview.approved"`.
    pub event_type: String,
    pub project_id: ProjectId,
    /// Event-specific data.
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl PreviewEvent {
    pub fn new(event_type: impl Into<String>, project_id: impl Into<ProjectId>) -> Self {
        Self {
            event_type: event_type.into(),
            project_id: project_id.into(),
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
