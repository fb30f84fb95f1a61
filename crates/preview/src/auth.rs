//! Preview auth controller.
//!
//! Tracks whether the current client may see a project's preview, with two
//! trust tiers:
//!
//! - [`TrustLevel::LocallyTrusted`]: a credential-store hit or a fresh email
//!   grant. Enough to render the preview.
//! - [`TrustLevel::BackendVerified`]: a preview token confirmed by the
//!   [`AccessVerifier`]. Required before any state-mutating action.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cadenza_core::access::VerifyFailure;
use cadenza_core::project::Project;
use cadenza_core::status::ValidationError;
use cadenza_core::types::ProjectId;
use cadenza_core::wire::normalize_email;

use crate::backend::{bounded, AccessVerifier, MagicLinkIssuer, DEFAULT_BACKEND_TIMEOUT};
use crate::credentials::CredentialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrustLevel {
    LocallyTrusted,
    BackendVerified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    Checking,
    Authenticated {
        email: Option<String>,
        trust: TrustLevel,
    },
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Which message to show after a successful `authenticate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthNotice {
    /// A magic link is on its way to the client's inbox.
    MagicLinkSent,
    /// Access was granted locally but the magic link could not be sent.
    MagicLinkUnavailable,
}

struct Inner {
    state: AuthState,
    verified_token: Option<String>,
}

pub struct PreviewAuthController {
    project_id: ProjectId,
    redirect_to: String,
    store: Arc<CredentialStore>,
    verifier: Arc<dyn AccessVerifier>,
    magic_links: Arc<dyn MagicLinkIssuer>,
    timeout: Duration,
    inner: Mutex<Inner>,
}

impl PreviewAuthController {
    pub fn new(
        project_id: impl Into<ProjectId>,
        redirect_to: impl Into<String>,
        store: Arc<CredentialStore>,
        verifier: Arc<dyn AccessVerifier>,
        magic_links: Arc<dyn MagicLinkIssuer>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            redirect_to: redirect_to.into(),
            store,
            verifier,
            magic_links,
            timeout: DEFAULT_BACKEND_TIMEOUT,
            inner: Mutex::new(Inner {
                state: AuthState::Unknown,
                verified_token: None,
            }),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Resolve the initial state from the credential store, without network calls.
    pub fn mount(&self) -> AuthState {
        self.set_state(AuthState::Checking);

        let status = self.store.get(&self.project_id);
        let state = if status.granted {
            tracing::debug!(project_id = %self.project_id, "Stored access grant found");
            AuthState::Authenticated {
                email: status.email,
                trust: TrustLevel::LocallyTrusted,
            }
        } else {
            AuthState::Unauthenticated
        };
        self.set_state(state.clone());
        state
    }

    /// Grant access for `email` and try to send a magic link.
    ///
    /// Only a syntactically invalid email fails. Backend failures are logged
    /// and reported through [`AuthNotice::MagicLinkUnavailable`].
    pub async fn authenticate(&self, email: &str) -> Result<AuthNotice, ValidationError> {
        let email = normalize_email(email)?;

        self.store.set(&self.project_id, &email);
        {
            let mut inner = self.lock();
            let trust = match inner.state {
                AuthState::Authenticated {
                    trust: TrustLevel::BackendVerified,
                    ..
                } => TrustLevel::BackendVerified,
                _ => TrustLevel::LocallyTrusted,
            };
            inner.state = AuthState::Authenticated {
                email: Some(email.clone()),
                trust,
            };
        }
        tracing::info!(project_id = %self.project_id, "Preview access granted locally");

        let sent = bounded(
            self.timeout,
            self.magic_links
                .send_magic_link(&email, &self.project_id, &self.redirect_to),
        )
        .await;

        match sent {
            Ok(()) => Ok(AuthNotice::MagicLinkSent),
            Err(e) => {
                tracing::warn!(
                    project_id = %self.project_id,
                    error = %e,
                    "Magic link not sent, keeping local grant"
                );
                Ok(AuthNotice::MagicLinkUnavailable)
            }
        }
    }

    /// Check `token` with the backend and, on success, upgrade to
    /// [`TrustLevel::BackendVerified`].
    ///
    /// A failed check leaves the current state untouched.
    pub async fn verify_token(&self, token: &str) -> Result<Project, VerifyFailure> {
        let verified = tokio::time::timeout(
            self.timeout,
            self.verifier.verify(token, &self.project_id),
        )
        .await
        .unwrap_or(Err(VerifyFailure::BackendError));

        match verified {
            Ok(project) => {
                self.store.set(&self.project_id, &project.client_email);
                let mut inner = self.lock();
                inner.state = AuthState::Authenticated {
                    email: Some(project.client_email.clone()),
                    trust: TrustLevel::BackendVerified,
                };
                inner.verified_token = Some(token.to_string());
                tracing::info!(project_id = %self.project_id, "Preview token verified");
                Ok(project)
            }
            Err(reason) => {
                tracing::warn!(
                    project_id = %self.project_id,
                    reason = %reason,
                    "Preview token rejected"
                );
                Err(reason)
            }
        }
    }

    pub fn state(&self) -> AuthState {
        self.lock().state.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().state.is_authenticated()
    }

    pub fn trust(&self) -> Option<TrustLevel> {
        match self.lock().state {
            AuthState::Authenticated { trust, .. } => Some(trust),
            _ => None,
        }
    }

    pub fn email(&self) -> Option<String> {
        match &self.lock().state {
            AuthState::Authenticated { email, .. } => email.clone(),
            _ => None,
        }
    }

    /// The token that produced [`TrustLevel::BackendVerified`], if any.
    pub fn verified_token(&self) -> Option<String> {
        self.lock().verified_token.clone()
    }

    /// Forget the grant everywhere and return to `Unauthenticated`.
    pub fn sign_out(&self) {
        self.store.clear(&self.project_id);
        let mut inner = self.lock();
        inner.state = AuthState::Unauthenticated;
        inner.verified_token = None;
    }

    fn set_state(&self, state: AuthState) {
        self.lock().state = state;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
