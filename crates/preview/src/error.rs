//! Error taxonomy of the preview client.
//!
//! Storage errors never appear here: the credential store and project cache
//! absorb them. Backend errors are absorbed by the reconciler (degraded mode)
//! and reported by workflow actions without touching local state.

use cadenza_core::status::ValidationError;

/// A call to the backend of record failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Backend did not answer in time")]
    Timeout,

    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Project not found")]
    NotFound,

    #[error("Project was modified concurrently: {0}")]
    Conflict(String),

    #[error("Backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected backend response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_decode() {
            BackendError::InvalidResponse(err.to_string())
        } else {
            BackendError::Unreachable(err.to_string())
        }
    }
}

/// Failure of a state-mutating preview action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(BackendError),

    #[error("Project changed since it was loaded; reload and try again")]
    Conflict,

    #[error("Access must be verified before changing the project")]
    NotVerified,

    #[error("Project is not backed by the server (offline or demo mode)")]
    Degraded,

    #[error("A submission is already in progress")]
    InFlight,
}

impl From<BackendError> for PreviewError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Conflict(_) => PreviewError::Conflict,
            other => PreviewError::Backend(other),
        }
    }
}

impl PreviewError {
    /// Message suitable for an inline error or toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Backend(BackendError::Timeout) => {
                "The server is taking too long. Please try again.".to_string()
            }
            Self::Backend(_) => "Could not reach the server. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn conflict_backend_error_becomes_preview_conflict() {
        let err: PreviewError = BackendError::Conflict("revision 3 != 4".into()).into();
        assert_matches!(err, PreviewError::Conflict);
    }

    #[test]
    fn other_backend_errors_are_wrapped() {
        let err: PreviewError = BackendError::Timeout.into();
        assert_matches!(err, PreviewError::Backend(BackendError::Timeout));
        assert!(err.user_message().contains("too long"));
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err: PreviewError = ValidationError::EmptyFeedback.into();
        assert_eq!(err.user_message(), "Feedback must not be empty");
    }
}
