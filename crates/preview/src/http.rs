//! HTTP client for the backend of record.
//!
//! [`PreviewApiClient`] implements every collaborator trait over the
//! `/api/v1` JSON endpoints served by `cadenza-api`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use cadenza_core::access::VerifyFailure;
use cadenza_core::project::Project;
use cadenza_core::wire::{
    FeedbackRequest, FeedbackResponse, MagicLinkRequest, VerifyTokenRequest, VerifyTokenResponse,
};

use crate::backend::{AccessVerifier, MagicLinkIssuer, ProjectSource, ProjectWriter};
use crate::error::BackendError;

/// Error body produced by the API: `{ "error": ..., "code": ... }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct DataBody<T> {
    data: T,
}

pub struct PreviewApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl PreviewApiClient {
    /// Client for the API at `base_url` with a per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }
}

/// Map a non-success response onto [`BackendError`].
async fn error_from(response: reqwest::Response) -> BackendError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unexpected status")
            .to_string(),
    };

    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound,
        StatusCode::CONFLICT => BackendError::Conflict(message),
        _ => BackendError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl AccessVerifier for PreviewApiClient {
    async fn verify(&self, token: &str, project_id: &str) -> Result<Project, VerifyFailure> {
        let request = VerifyTokenRequest {
            token: Some(token.to_string()),
            preview_id: Some(project_id.to_string()),
        };

        let response = self
            .client
            .post(self.url("/preview/verify"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(project_id, error = %e, "Token verification request failed");
                VerifyFailure::BackendError
            })?;

        let status = response.status();
        let body = response.json::<VerifyTokenResponse>().await.ok();
        match body {
            Some(VerifyTokenResponse {
                valid: true,
                project: Some(project),
                ..
            }) => Ok(project),
            Some(VerifyTokenResponse {
                reason: Some(reason),
                ..
            }) => Err(reason),
            _ if status.is_success() => Err(VerifyFailure::BackendError),
            _ => Err(VerifyFailure::from_http_status(status.as_u16())),
        }
    }
}

#[async_trait]
impl MagicLinkIssuer for PreviewApiClient {
    async fn send_magic_link(
        &self,
        email: &str,
        project_id: &str,
        redirect_to: &str,
    ) -> Result<(), BackendError> {
        let request = MagicLinkRequest {
            email: email.to_string(),
            redirect_to: redirect_to.to_string(),
            project_id: Some(project_id.to_string()),
        };
        let response = self
            .client
            .post(self.url("/auth/magic-link"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectSource for PreviewApiClient {
    async fn fetch_project(&self, project_id: &str) -> Result<Project, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("/preview/projects/{project_id}")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        let body: DataBody<Project> = response.json().await?;
        Ok(body.data)
    }
}

#[async_trait]
impl ProjectWriter for PreviewApiClient {
    async fn submit_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackResponse, BackendError> {
        let response = self
            .client
            .post(self.url("/preview/feedback"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(response.json().await?)
    }
}
