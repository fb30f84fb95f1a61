//! Access verification outcomes and access-log methods.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why the backend refused to verify a preview token.
///
/// Invalid, forged and expired tokens all collapse into [`Expired`] so that
/// validation internals are not leaked to callers.
///
/// [`Expired`]: VerifyFailure::Expired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum VerifyFailure {
    #[error("Token and preview id are required")]
    MissingFields,

    #[error("Preview not found")]
    NotFound,

    #[error("Invalid or expired token")]
    Expired,

    #[error("Preview service unavailable")]
    BackendError,
}

impl VerifyFailure {
    /// HTTP status used by the verification endpoint for this failure.
    pub fn http_status(self) -> u16 {
        match self {
            Self::MissingFields => 400,
            Self::Expired => 401,
            Self::NotFound => 404,
            Self::BackendError => 500,
        }
    }

    /// Inverse of [`http_status`](Self::http_status) for clients reading a
    /// response without a `reason` field.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::MissingFields,
            401 | 403 => Self::Expired,
            404 => Self::NotFound,
            _ => Self::BackendError,
        }
    }
}

/// How a client reached a project, recorded in the access log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMethod {
    /// Preview token verified by the backend.
    Token,
    /// Feedback or approval submitted.
    Feedback,
    /// Operator published a preview round.
    Notification,
}

impl AccessMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Feedback => "feedback",
            Self::Notification => "notification",
        }
    }
}

impl fmt::Display for AccessMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
