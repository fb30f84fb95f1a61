//! Project status actions as seen from the preview page.
//!
//! `submit_feedback` and `approve_version` validate locally, then write to
//! the backend of record. Local state only advances once the backend has
//! accepted the write; the returned copy replaces both the in-memory project
//! and the cache entry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cadenza_core::project::{Project, ProjectStatus};
use cadenza_core::status::{check_approval, check_feedback, FeedbackDecision};
use cadenza_core::wire::FeedbackRequest;

use crate::auth::{PreviewAuthController, TrustLevel};
use crate::backend::{bounded, ProjectWriter, DEFAULT_BACKEND_TIMEOUT};
use crate::error::PreviewError;
use crate::reconcile::{LoadedProject, ProjectCache};

/// Per-action re-entrancy guard. Cleared on drop.
#[derive(Debug)]
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, PreviewError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| PreviewError::InFlight)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ProjectWorkflow {
    auth: Arc<PreviewAuthController>,
    writer: Arc<dyn ProjectWriter>,
    cache: Arc<dyn ProjectCache>,
    timeout: Duration,
    loaded: Mutex<LoadedProject>,
    feedback_in_flight: AtomicBool,
    approval_in_flight: AtomicBool,
}

impl ProjectWorkflow {
    pub fn new(
        loaded: LoadedProject,
        auth: Arc<PreviewAuthController>,
        writer: Arc<dyn ProjectWriter>,
        cache: Arc<dyn ProjectCache>,
    ) -> Self {
        Self {
            auth,
            writer,
            cache,
            timeout: DEFAULT_BACKEND_TIMEOUT,
            loaded: Mutex::new(loaded),
            feedback_in_flight: AtomicBool::new(false),
            approval_in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn project(&self) -> Project {
        self.lock().project.clone()
    }

    pub fn loaded(&self) -> LoadedProject {
        self.lock().clone()
    }

    pub fn is_degraded(&self) -> bool {
        self.lock().degraded
    }

    /// Swap in a freshly reconciled copy, e.g. after a conflict.
    pub fn replace(&self, loaded: LoadedProject) {
        *self.lock() = loaded;
    }

    pub fn is_submitting(&self) -> bool {
        self.feedback_in_flight.load(Ordering::Acquire)
            || self.approval_in_flight.load(Ordering::Acquire)
    }

    /// Whether the "send feedback" button should be enabled.
    pub fn can_submit_feedback(&self, content: &str) -> bool {
        let loaded = self.lock();
        !loaded.degraded
            && !self.feedback_in_flight.load(Ordering::Acquire)
            && check_feedback(&loaded.project, content, None).is_ok()
    }

    /// Whether the "approve" button should be enabled for `selected`.
    pub fn can_approve(&self, selected: Option<&str>) -> bool {
        let loaded = self.lock();
        !loaded.degraded
            && !self.approval_in_flight.load(Ordering::Acquire)
            && check_approval(&loaded.project, selected).is_ok()
    }

    pub async fn submit_feedback(
        &self,
        content: &str,
        version_id: Option<&str>,
    ) -> Result<Project, PreviewError> {
        let project = self.project();
        let content = check_feedback(&project, content, version_id)?;
        self.ensure_writable()?;
        let _guard = InFlight::acquire(&self.feedback_in_flight)?;

        let request = self.request(&project, FeedbackDecision::Feedback, content, version_id);
        self.write(request).await
    }

    pub async fn approve_version(&self, version_id: Option<&str>) -> Result<Project, PreviewError> {
        let project = self.project();
        let version = check_approval(&project, version_id)?;
        let version_id = version.id.clone();
        self.ensure_writable()?;
        let _guard = InFlight::acquire(&self.approval_in_flight)?;

        let request = self.request(&project, FeedbackDecision::Approved, "", Some(&version_id));
        self.write(request).await
    }

    fn ensure_writable(&self) -> Result<(), PreviewError> {
        if self.is_degraded() {
            return Err(PreviewError::Degraded);
        }
        if self.auth.trust() != Some(TrustLevel::BackendVerified) {
            return Err(PreviewError::NotVerified);
        }
        Ok(())
    }

    fn request(
        &self,
        project: &Project,
        decision: FeedbackDecision,
        content: &str,
        version_id: Option<&str>,
    ) -> FeedbackRequest {
        FeedbackRequest {
            project_id: project.id.clone(),
            client_name: Some(project.client_name.clone()),
            client_email: self.auth.email(),
            feedback: content.to_string(),
            status: decision,
            token: self.auth.verified_token(),
            version_id: version_id.map(str::to_string),
            expected_revision: Some(project.revision),
        }
    }

    async fn write(&self, request: FeedbackRequest) -> Result<Project, PreviewError> {
        let project_id = request.project_id.clone();
        let response = match bounded(self.timeout, self.writer.submit_feedback(&request)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    project_id = %project_id,
                    decision = request.status.as_str(),
                    error = %e,
                    "Project write failed, local state unchanged"
                );
                return Err(e.into());
            }
        };

        let project = response.project;
        self.cache.put(&project);
        *self.lock() = LoadedProject::from_backend(project.clone());

        tracing::info!(
            project_id = %project_id,
            status = %project.status,
            revision = project.revision,
            "Project updated"
        );
        if project.status == ProjectStatus::Approved {
            tracing::info!(project_id = %project_id, "Project approved");
        }
        Ok(project)
    }

    fn lock(&self) -> MutexGuard<'_, LoadedProject> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
