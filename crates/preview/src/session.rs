//! One preview page load, wired end to end.
//!
//! [`PreviewSession::open`] follows the page's data flow: private-mode
//! detection, credential lookup, optional token verification, project
//! reconciliation, then the workflow over the reconciled copy.

use std::sync::Arc;

use cadenza_core::error::CoreError;
use cadenza_core::project::{validate_project_id, Project};

use crate::auth::PreviewAuthController;
use crate::backend::{AccessVerifier, MagicLinkIssuer, ProjectSource, ProjectWriter};
use crate::config::PreviewClientConfig;
use crate::cookie::CookieJar;
use crate::credentials::CredentialStore;
use crate::private_mode::PrivateModeDetector;
use crate::reconcile::{LoadedProject, ProjectCache, StorageProjectCache, SyncReconciler};
use crate::storage::{MemoryStorage, StorageBackend};
use crate::workflow::ProjectWorkflow;

/// Everything the preview page talks to on the backend of record.
pub trait PreviewBackend:
    AccessVerifier + MagicLinkIssuer + ProjectSource + ProjectWriter + 'static
{
}

impl<T> PreviewBackend for T where
    T: AccessVerifier + MagicLinkIssuer + ProjectSource + ProjectWriter + 'static
{
}

/// The per-origin storage a page load can use.
#[derive(Clone)]
pub struct BrowserStorage {
    pub cookies: Arc<CookieJar>,
    pub persistent: Arc<dyn StorageBackend>,
    pub session: Arc<dyn StorageBackend>,
}

impl BrowserStorage {
    /// In-process storage for `origin`.
    pub fn in_memory(origin: &str) -> Self {
        Self {
            cookies: Arc::new(CookieJar::for_origin(origin)),
            persistent: Arc::new(MemoryStorage::persistent()),
            session: Arc::new(MemoryStorage::session()),
        }
    }

    /// Credential backends in priority order.
    fn credential_backends(&self) -> Vec<Arc<dyn StorageBackend>> {
        vec![
            self.cookies.clone() as Arc<dyn StorageBackend>,
            self.persistent.clone(),
            self.session.clone(),
        ]
    }
}

pub struct PreviewSession {
    auth: Arc<PreviewAuthController>,
    reconciler: SyncReconciler,
    workflow: ProjectWorkflow,
}

impl PreviewSession {
    /// Open the preview of `project_id`.
    ///
    /// Only an invalid project id fails; backend trouble degrades the
    /// session instead. A `token` that does not verify leaves the client
    /// at whatever trust the credential store grants.
    pub async fn open<B: PreviewBackend>(
        project_id: &str,
        token: Option<&str>,
        config: &PreviewClientConfig,
        storage: BrowserStorage,
        backend: Arc<B>,
    ) -> Result<Self, CoreError> {
        validate_project_id(project_id)?;

        let detector = Arc::new(PrivateModeDetector::new(storage.persistent.clone()));
        let private = detector.detect();
        let store = Arc::new(
            CredentialStore::new(storage.credential_backends(), detector)
                .with_ttl(config.grant_ttl),
        );

        let auth = Arc::new(
            PreviewAuthController::new(
                project_id,
                config.preview_url(project_id),
                store,
                backend.clone(),
                backend.clone(),
            )
            .with_timeout(config.backend_timeout),
        );
        let state = auth.mount();
        tracing::debug!(project_id, private, ?state, "Preview session mounted");

        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            // Failure is logged by the controller and keeps the mounted state.
            let _ = auth.verify_token(token).await;
        }

        let cache_backend = if private {
            storage.session.clone()
        } else {
            storage.persistent.clone()
        };
        let cache: Arc<dyn ProjectCache> = Arc::new(StorageProjectCache::new(cache_backend));

        let reconciler = SyncReconciler::new(backend.clone(), cache.clone())
            .with_timeout(config.backend_timeout);
        let loaded = reconciler.load(project_id).await;

        let workflow = ProjectWorkflow::new(loaded, auth.clone(), backend, cache)
            .with_timeout(config.backend_timeout);

        Ok(Self {
            auth,
            reconciler,
            workflow,
        })
    }

    pub fn auth(&self) -> &PreviewAuthController {
        &self.auth
    }

    pub fn workflow(&self) -> &ProjectWorkflow {
        &self.workflow
    }

    pub fn project(&self) -> Project {
        self.workflow.project()
    }

    pub fn is_degraded(&self) -> bool {
        self.workflow.is_degraded()
    }

    /// Reconcile again, e.g. after a conflict or when the backend comes back.
    pub async fn reload(&self) -> LoadedProject {
        let loaded = self.reconciler.load(self.auth.project_id()).await;
        self.workflow.replace(loaded.clone());
        loaded
    }
}
