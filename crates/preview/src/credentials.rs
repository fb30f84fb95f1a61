//! Credential store: remembers which projects this client may preview.
//!
//! Grants are written to a priority-ordered list of storage backends:
//!
//! 1. cookies, always attempted;
//! 2. persistent storage, only when the private-mode detector says it works,
//!    with an absolute expiry key so staleness can be checked on read;
//! 3. session storage, only when no persistent backend took the grant.
//!
//! Reads walk the same list and return the first live grant. Storage errors
//! never leave this module: a failing backend is logged and skipped.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use cadenza_core::grant::{AccessGrant, DEFAULT_GRANT_TTL_DAYS};
use cadenza_core::types::Timestamp;

use crate::private_mode::PrivateModeDetector;
use crate::storage::{BackendKind, StorageBackend, StorageError};

const ACCESS_GRANTED: &str = "true";

pub fn access_key(project_id: &str) -> String {
    format!("preview_access_{project_id}")
}

pub fn email_key(project_id: &str) -> String {
    format!("preview_email_{project_id}")
}

pub fn expiry_key(project_id: &str) -> String {
    format!("preview_access_expiry_{project_id}")
}

/// Result of looking up a project's credential.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CredentialStatus {
    pub granted: bool,
    pub email: Option<String>,
}

impl CredentialStatus {
    fn granted(email: Option<String>) -> Self {
        Self {
            granted: true,
            email,
        }
    }
}

pub struct CredentialStore {
    backends: Vec<Arc<dyn StorageBackend>>,
    detector: Arc<PrivateModeDetector>,
    ttl: Duration,
}

impl CredentialStore {
    /// Store over `backends`, polled in the given order.
    pub fn new(backends: Vec<Arc<dyn StorageBackend>>, detector: Arc<PrivateModeDetector>) -> Self {
        Self {
            backends,
            detector,
            ttl: Duration::days(DEFAULT_GRANT_TTL_DAYS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Grant access to `project_id` for `email`, replacing any previous grant.
    ///
    /// The expiry is computed once here and never extended by reads.
    pub fn set(&self, project_id: &str, email: &str) -> AccessGrant {
        let grant = AccessGrant::new(project_id, Some(email.to_string()), Utc::now(), self.ttl);
        let stored_in = self.write_grant(&grant);
        if stored_in == 0 {
            tracing::warn!(project_id, "No storage backend accepted the access grant");
        }
        grant
    }

    /// Write an already-built grant. Returns how many backends accepted it.
    pub fn write_grant(&self, grant: &AccessGrant) -> usize {
        let private = self.detector.detect();
        let mut stored_in = 0;
        let mut persisted = false;

        for backend in &self.backends {
            let kind = backend.kind();
            if kind.needs_persistent_storage() && private {
                continue;
            }
            if kind == BackendKind::Session && persisted {
                continue;
            }

            match write_to(backend.as_ref(), grant) {
                Ok(()) => {
                    stored_in += 1;
                    if kind == BackendKind::Persistent {
                        persisted = true;
                    }
                    tracing::debug!(
                        project_id = %grant.project_id,
                        backend = kind.as_str(),
                        "Stored access grant"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        project_id = %grant.project_id,
                        backend = kind.as_str(),
                        error = %e,
                        "Storage backend rejected access grant, falling through"
                    );
                }
            }
        }
        stored_in
    }

    /// Look up the grant for `project_id`. Expired grants count as absent.
    pub fn get(&self, project_id: &str) -> CredentialStatus {
        let private = self.detector.detect();
        let now = Utc::now();

        for backend in &self.backends {
            let kind = backend.kind();
            if kind.needs_persistent_storage() && private {
                continue;
            }
            match read_from(backend.as_ref(), project_id, now) {
                Ok(Some(status)) => return status,
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        project_id,
                        backend = kind.as_str(),
                        error = %e,
                        "Storage backend unreadable, falling through"
                    );
                }
            }
        }
        CredentialStatus::default()
    }

    /// Revoke the grant for `project_id` in every backend.
    pub fn clear(&self, project_id: &str) {
        for backend in &self.backends {
            if let Err(e) = remove_from(backend.as_ref(), project_id) {
                tracing::debug!(
                    project_id,
                    backend = backend.kind().as_str(),
                    error = %e,
                    "Could not clear access grant"
                );
            }
        }
    }
}

fn write_to(backend: &dyn StorageBackend, grant: &AccessGrant) -> Result<(), StorageError> {
    let id = grant.project_id.as_str();
    let email = grant.email.as_deref().unwrap_or_default();

    if backend.kind().has_native_expiry() {
        backend.write(&access_key(id), ACCESS_GRANTED, Some(grant.expires_at))?;
        backend.write(&email_key(id), email, Some(grant.expires_at))?;
    } else {
        backend.write(&access_key(id), ACCESS_GRANTED, None)?;
        backend.write(&email_key(id), email, None)?;
        backend.write(&expiry_key(id), &grant.expires_at.to_rfc3339(), None)?;
    }
    Ok(())
}

fn read_from(
    backend: &dyn StorageBackend,
    project_id: &str,
    now: Timestamp,
) -> Result<Option<CredentialStatus>, StorageError> {
    if backend.read(&access_key(project_id))?.as_deref() != Some(ACCESS_GRANTED) {
        return Ok(None);
    }

    if !backend.kind().has_native_expiry() {
        let expires_at = backend
            .read(&expiry_key(project_id))?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        match expires_at {
            Some(expires_at) if expires_at > now => {}
            Some(_) => {
                tracing::debug!(
                    project_id,
                    backend = backend.kind().as_str(),
                    "Stored access grant expired"
                );
                let _ = remove_from(backend, project_id);
                return Ok(None);
            }
            None => return Ok(None),
        }
    }

    let email = backend
        .read(&email_key(project_id))?
        .filter(|email| !email.is_empty());
    Ok(Some(CredentialStatus::granted(email)))
}

fn remove_from(backend: &dyn StorageBackend, project_id: &str) -> Result<(), StorageError> {
    backend.remove(&access_key(project_id))?;
    backend.remove(&email_key(project_id))?;
    if !backend.kind().has_native_expiry() {
        backend.remove(&expiry_key(project_id))?;
    }
    Ok(())
}
