//! In-process backend of record.
//!
//! Implements every collaborator trait against a `HashMap`, applying the same
//! status rules as the real backend. Used by tests and offline tooling; it can
//! be switched unreachable to exercise degraded paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use cadenza_core::access::{AccessMethod, VerifyFailure};
use cadenza_core::grant::DEFAULT_PREVIEW_CODE_TTL_DAYS;
use cadenza_core::project::{FeedbackEntry, FeedbackStatus, Project};
use cadenza_core::status::{self, StatusAction};
use cadenza_core::token::{self, TokenCodec};
use cadenza_core::types::{DbId, Timestamp};
use cadenza_core::wire::{FeedbackRequest, FeedbackResponse};

use crate::backend::{AccessVerifier, MagicLinkIssuer, ProjectSource, ProjectWriter};
use crate::error::BackendError;

/// One recorded access event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogEntry {
    pub project_id: String,
    pub method: AccessMethod,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
struct PreviewCode {
    project_id: String,
    active: bool,
    expires_at: Timestamp,
}

#[derive(Default)]
struct State {
    projects: HashMap<String, Project>,
    codes: HashMap<String, PreviewCode>,
    access_log: Vec<AccessLogEntry>,
    magic_links: Vec<(String, String)>,
    next_feedback_id: DbId,
}

pub struct MemoryBackend {
    state: Mutex<State>,
    codec: TokenCodec,
    reachable: AtomicBool,
    magic_links_enabled: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(TokenCodec::unsigned())
    }
}

impl MemoryBackend {
    pub fn new(codec: TokenCodec) -> Self {
        Self {
            state: Mutex::new(State {
                next_feedback_id: 1,
                ..State::default()
            }),
            codec,
            reachable: AtomicBool::new(true),
            magic_links_enabled: AtomicBool::new(true),
        }
    }

    pub fn insert_project(&self, project: Project) {
        self.state().projects.insert(project.id.clone(), project);
    }

    pub fn project(&self, project_id: &str) -> Option<Project> {
        self.state().projects.get(project_id).cloned()
    }

    /// Apply an out-of-band change, as another tab or operator would.
    pub fn modify_project(&self, project_id: &str, change: impl FnOnce(&mut Project)) {
        if let Some(project) = self.state().projects.get_mut(project_id) {
            change(project);
            project.revision += 1;
        }
    }

    /// Mint a preview code for `project_id`, deactivating older ones.
    pub fn issue_token(&self, project_id: &str, ttl: Duration) -> String {
        let token = self.codec.issue(project_id);
        let mut state = self.state();
        for code in state.codes.values_mut() {
            if code.project_id == project_id {
                code.active = false;
            }
        }
        state.codes.insert(
            token.clone(),
            PreviewCode {
                project_id: project_id.to_string(),
                active: true,
                expires_at: Utc::now() + ttl,
            },
        );
        token
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_magic_links_enabled(&self, enabled: bool) {
        self.magic_links_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn access_log(&self) -> Vec<AccessLogEntry> {
        self.state().access_log.clone()
    }

    /// The usable preview code of `project_id`, if one exists.
    pub fn active_token(&self, project_id: &str) -> Option<String> {
        let now = Utc::now();
        self.state()
            .codes
            .iter()
            .find(|(_, code)| code.project_id == project_id && code.active && code.expires_at > now)
            .map(|(token, _)| token.clone())
    }

    /// `(email, link)` pairs of every magic link sent.
    pub fn sent_magic_links(&self) -> Vec<(String, String)> {
        self.state().magic_links.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_reachable(&self) -> Result<(), BackendError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unreachable("memory backend offline".into()))
        }
    }

    fn check_token(&self, state: &State, token: &str, project_id: &str) -> Result<(), VerifyFailure> {
        let claims = self.codec.decode(token).map_err(|_| VerifyFailure::Expired)?;
        if claims.project_id != project_id {
            return Err(VerifyFailure::Expired);
        }
        let code = state.codes.get(token).ok_or(VerifyFailure::Expired)?;
        if !code.active || code.expires_at <= Utc::now() || code.project_id != project_id {
            return Err(VerifyFailure::Expired);
        }
        Ok(())
    }
}

#[async_trait]
impl AccessVerifier for MemoryBackend {
    async fn verify(&self, token: &str, project_id: &str) -> Result<Project, VerifyFailure> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(VerifyFailure::BackendError);
        }
        if token.trim().is_empty() || project_id.trim().is_empty() {
            return Err(VerifyFailure::MissingFields);
        }

        let mut state = self.state();
        self.check_token(&state, token, project_id)?;
        let project = state
            .projects
            .get(project_id)
            .cloned()
            .ok_or(VerifyFailure::NotFound)?;
        state.access_log.push(AccessLogEntry {
            project_id: project_id.to_string(),
            method: AccessMethod::Token,
            email: Some(project.client_email.clone()),
        });
        Ok(project)
    }
}

#[async_trait]
impl MagicLinkIssuer for MemoryBackend {
    async fn send_magic_link(
        &self,
        email: &str,
        project_id: &str,
        redirect_to: &str,
    ) -> Result<(), BackendError> {
        self.ensure_reachable()?;
        if !self.magic_links_enabled.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected {
                status: 503,
                message: "Email delivery is not configured".into(),
            });
        }

        let is_client = self
            .project(project_id)
            .is_some_and(|p| p.client_email.eq_ignore_ascii_case(email));
        let link = if is_client {
            let token = match self.active_token(project_id) {
                Some(token) => token,
                None => self.issue_token(project_id, Duration::days(DEFAULT_PREVIEW_CODE_TTL_DAYS)),
            };
            token::link_with_token(redirect_to, &token)
        } else {
            redirect_to.to_string()
        };

        self.state().magic_links.push((email.to_string(), link));
        Ok(())
    }
}

#[async_trait]
impl ProjectSource for MemoryBackend {
    async fn fetch_project(&self, project_id: &str) -> Result<Project, BackendError> {
        self.ensure_reachable()?;
        self.project(project_id).ok_or(BackendError::NotFound)
    }
}

#[async_trait]
impl ProjectWriter for MemoryBackend {
    async fn submit_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackResponse, BackendError> {
        self.ensure_reachable()?;
        let mut state = self.state();

        let token = request
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| BackendError::Rejected {
                status: 401,
                message: "A preview token is required".into(),
            })?;
        self.check_token(&state, token.trim(), &request.project_id)
            .map_err(|reason| BackendError::Rejected {
                status: reason.http_status(),
                message: reason.to_string(),
            })?;

        let next_id = state.next_feedback_id;
        let project = state
            .projects
            .get_mut(&request.project_id)
            .ok_or(BackendError::NotFound)?;

        if let Some(expected) = request.expected_revision {
            if expected != project.revision {
                return Err(BackendError::Conflict(format!(
                    "expected revision {expected}, found {}",
                    project.revision
                )));
            }
        }

        let now = Utc::now();
        let mut updated = project.clone();
        let outcome = match request.status.action() {
            StatusAction::SubmitFeedback => {
                let entry = FeedbackEntry {
                    id: next_id,
                    content: request.feedback.trim().to_string(),
                    version_id: request.version_id.clone(),
                    status: FeedbackStatus::Pending,
                    created_at: now,
                };
                status::apply_feedback(&mut updated, entry, now)
            }
            StatusAction::ApproveVersion => match request.version_id.as_deref() {
                Some(version_id) => status::apply_approval(&mut updated, version_id, now),
                None => status::check_approval(&updated, None).map(|_| ()),
            },
        };
        outcome.map_err(|e| BackendError::Rejected {
            status: 400,
            message: e.to_string(),
        })?;

        *project = updated.clone();
        if request.status.action() == StatusAction::SubmitFeedback {
            state.next_feedback_id += 1;
        }
        state.access_log.push(AccessLogEntry {
            project_id: request.project_id.clone(),
            method: AccessMethod::Feedback,
            email: request.client_email.clone(),
        });

        Ok(FeedbackResponse {
            success: true,
            status: updated.status,
            project: updated,
        })
    }
}
