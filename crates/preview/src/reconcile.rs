//! Sync reconciler: decides which copy of a project the page renders.
//!
//! The backend of record always wins. When it cannot answer, the local cache
//! is used, and failing that the seeded demo project. Both fallbacks are
//! flagged `degraded` so state-mutating actions can be refused.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use cadenza_core::project::{demo_project, Project};

use crate::backend::{bounded, ProjectSource, DEFAULT_BACKEND_TIMEOUT};
use crate::storage::StorageBackend;

// ---------------------------------------------------------------------------
// Local project cache
// ---------------------------------------------------------------------------

pub fn cache_key(project_id: &str) -> String {
    format!("preview_project_{project_id}")
}

/// One slot per project id, last write wins. Implementations never fail.
pub trait ProjectCache: Send + Sync {
    fn get(&self, project_id: &str) -> Option<Project>;
    fn put(&self, project: &Project);
    fn evict(&self, project_id: &str);
}

#[derive(Default)]
pub struct MemoryProjectCache {
    entries: Mutex<HashMap<String, Project>>,
}

impl MemoryProjectCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectCache for MemoryProjectCache {
    fn get(&self, project_id: &str) -> Option<Project> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(project_id).cloned()
    }

    fn put(&self, project: &Project) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(project.id.clone(), project.clone());
    }

    fn evict(&self, project_id: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(project_id);
    }
}

/// Cache persisted as JSON in a storage backend.
pub struct StorageProjectCache {
    backend: Arc<dyn StorageBackend>,
}

impl StorageProjectCache {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }
}

impl ProjectCache for StorageProjectCache {
    fn get(&self, project_id: &str) -> Option<Project> {
        let raw = match self.backend.read(&cache_key(project_id)) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::debug!(project_id, error = %e, "Project cache unreadable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(project) => Some(project),
            Err(e) => {
                tracing::debug!(project_id, error = %e, "Discarding unparsable cached project");
                self.evict(project_id);
                None
            }
        }
    }

    fn put(&self, project: &Project) {
        let raw = match serde_json::to_string(project) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(project_id = %project.id, error = %e, "Could not serialize project");
                return;
            }
        };
        if let Err(e) = self.backend.write(&cache_key(&project.id), &raw, None) {
            tracing::debug!(project_id = %project.id, error = %e, "Project cache not written");
        }
    }

    fn evict(&self, project_id: &str) {
        if let Err(e) = self.backend.remove(&cache_key(project_id)) {
            tracing::debug!(project_id, error = %e, "Project cache entry not removed");
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectOrigin {
    Backend,
    Cache,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProject {
    pub project: Project,
    pub origin: ProjectOrigin,
    /// `true` unless the backend of record served this copy.
    pub degraded: bool,
}

impl LoadedProject {
    pub fn from_backend(project: Project) -> Self {
        Self {
            project,
            origin: ProjectOrigin::Backend,
            degraded: false,
        }
    }
}

pub struct SyncReconciler {
    source: Arc<dyn ProjectSource>,
    cache: Arc<dyn ProjectCache>,
    timeout: Duration,
}

impl SyncReconciler {
    pub fn new(source: Arc<dyn ProjectSource>, cache: Arc<dyn ProjectCache>) -> Self {
        Self {
            source,
            cache,
            timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> Arc<dyn ProjectCache> {
        self.cache.clone()
    }

    /// Load `project_id`. Never fails.
    pub async fn load(&self, project_id: &str) -> LoadedProject {
        let cached = self.cache.get(project_id);

        match bounded(self.timeout, self.source.fetch_project(project_id)).await {
            Ok(project) => {
                self.cache.put(&project);
                LoadedProject::from_backend(project)
            }
            Err(e) => match cached {
                Some(project) => {
                    tracing::warn!(project_id, error = %e, "Backend unavailable, serving cached project");
                    LoadedProject {
                        project,
                        origin: ProjectOrigin::Cache,
                        degraded: true,
                    }
                }
                None => {
                    tracing::warn!(project_id, error = %e, "Backend unavailable, serving demo project");
                    LoadedProject {
                        project: demo_project(project_id),
                        origin: ProjectOrigin::Demo,
                        degraded: true,
                    }
                }
            },
        }
    }
}
