//! Collaborator boundaries toward the backend of record.
//!
//! The preview client only depends on these traits. [`crate::http`] provides
//! the HTTP implementation and [`crate::memory`] an in-process one.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use cadenza_core::access::VerifyFailure;
use cadenza_core::project::Project;
use cadenza_core::wire::{FeedbackRequest, FeedbackResponse};

use crate::error::BackendError;

/// Default bound on any single backend call.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Confirms that a preview token is active and unexpired for a project.
///
/// Implementations log an access event on success.
#[async_trait]
pub trait AccessVerifier: Send + Sync {
    async fn verify(&self, token: &str, project_id: &str) -> Result<Project, VerifyFailure>;
}

/// Sends a magic-link email that brings the client back to `redirect_to`.
///
/// When `email` is the client email of `project_id`, the link carries the
/// project's preview token so the return visit can be verified.
#[async_trait]
pub trait MagicLinkIssuer: Send + Sync {
    async fn send_magic_link(
        &self,
        email: &str,
        project_id: &str,
        redirect_to: &str,
    ) -> Result<(), BackendError>;
}

/// Reads the backend's copy of a project.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    async fn fetch_project(&self, project_id: &str) -> Result<Project, BackendError>;
}

/// Writes feedback and approvals to the backend of record.
#[async_trait]
pub trait ProjectWriter: Send + Sync {
    async fn submit_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackResponse, BackendError>;
}

/// Run a backend call, turning an overrun of `limit` into [`BackendError::Timeout`].
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(BackendError::Timeout))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out_hanging_calls() {
        let hanging = std::future::pending::<Result<(), BackendError>>();
        let result = bounded(Duration::from_secs(15), hanging).await;
        assert_matches!(result, Err(BackendError::Timeout));
    }

    #[tokio::test]
    async fn bounded_passes_through_results() {
        let result = bounded(Duration::from_secs(1), async { Ok::<_, BackendError>(7) }).await;
        assert_eq!(result, Ok(7));
    }
}
