//! Project aggregate as seen by preview clients.
//!
//! The backend of record owns every [`Project`]; clients hold a read-through
//! cached copy keyed by project id. Status changes go exclusively through the
//! rules in [`crate::status`].

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::token::TOKEN_DELIMITER;
use crate::types::{DbId, ProjectId, Timestamp};

/// Maximum length of an external project identifier.
pub const MAX_PROJECT_ID_LENGTH: usize = 64;

/// Project id used for the seeded demo record.
pub const DEMO_PROJECT_ID: &str = "demo";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a project's preview round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// Previews delivered, no client reaction yet.
    Waiting,
    /// Client has sent feedback and awaits a new round.
    Feedback,
    /// Client approved a version. Terminal for the client.
    Approved,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [Self::Waiting, Self::Feedback, Self::Approved];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Feedback => "feedback",
            Self::Approved => "approved",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown project status '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Versions and feedback
// ---------------------------------------------------------------------------

/// One candidate mix of the commissioned track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub audio_url: String,
    #[serde(default)]
    pub recommended: bool,
}

/// Processing state of a feedback entry on the operator side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Processed,
}

impl FeedbackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
        }
    }
}

impl FromStr for FeedbackStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processed" => Ok(Self::Processed),
            other => Err(CoreError::Validation(format!(
                "Unknown feedback status '{other}'"
            ))),
        }
    }
}

/// Append-only record of something the client said about the previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub id: DbId,
    pub content: String,
    pub version_id: Option<String>,
    pub status: FeedbackStatus,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub client_name: String,
    pub client_email: String,
    pub title: String,
    pub status: ProjectStatus,
    pub versions: Vec<Version>,
    pub feedback_history: Vec<FeedbackEntry>,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub last_activity_at: Timestamp,
    /// Optimistic-concurrency counter, incremented by every backend write.
    #[serde(default)]
    pub revision: i64,
}

impl Project {
    pub fn find_version(&self, version_id: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    pub fn recommended_version(&self) -> Option<&Version> {
        self.versions.iter().find(|v| v.recommended)
    }

    pub fn is_demo(&self) -> bool {
        self.id == DEMO_PROJECT_ID
    }
}

/// Seeded demo project shown when neither backend nor cache can serve a project.
///
/// Carries the requested id in its title so the page can still reference it,
/// but its own id is [`DEMO_PROJECT_ID`].
pub fn demo_project(requested_id: &str) -> Project {
    let now = Utc::now();
    Project {
        id: DEMO_PROJECT_ID.to_string(),
        client_name: "Cliente Demo".to_string(),
        client_email: "demo@cadenza.local".to_string(),
        title: format!("Prévia de demonstração ({requested_id})"),
        status: ProjectStatus::Waiting,
        versions: vec![
            Version {
                id: "demo-v1".to_string(),
                name: "Versão Acústica".to_string(),
                description: Some("Violão e voz".to_string()),
                audio_url: "https://cdn.cadenza.local/demo/acoustic.mp3".to_string(),
                recommended: false,
            },
            Version {
                id: "demo-v2".to_string(),
                name: "Versão Completa".to_string(),
                description: Some("Banda completa com arranjo de cordas".to_string()),
                audio_url: "https://cdn.cadenza.local/demo/full.mp3".to_string(),
                recommended: true,
            },
        ],
        feedback_history: Vec::new(),
        created_at: now,
        expires_at: Some(now + Duration::days(crate::grant::DEFAULT_PREVIEW_CODE_TTL_DAYS)),
        last_activity_at: now,
        revision: 0,
    }
}

/// Validate an external project identifier.
///
/// Ids must be non-empty, at most [`MAX_PROJECT_ID_LENGTH`] characters, and
/// restricted to ASCII alphanumerics, `-` and `_` (in particular they never
/// contain the token delimiter).
pub fn validate_project_id(id: &str) -> Result<(), CoreError> {
    if id.is_empty() {
        return Err(CoreError::Validation("Project id must not be empty".into()));
    }
    if id.len() > MAX_PROJECT_ID_LENGTH {
        return Err(CoreError::Validation(format!(
            "Project id exceeds {MAX_PROJECT_ID_LENGTH} characters"
        )));
    }
    if id.contains(TOKEN_DELIMITER)
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::Validation(format!(
            "Project id '{id}' contains invalid characters"
        )));
    }
    Ok(())
}
