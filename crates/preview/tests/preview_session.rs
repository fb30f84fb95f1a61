//! End-to-end preview page flows against the in-process backend.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Duration;

use cadenza_core::project::ProjectStatus;
use cadenza_core::status::ValidationError;
use cadenza_core::token::token_from_link;
use cadenza_preview::credentials::access_key;
use cadenza_preview::reconcile::{cache_key, ProjectCache, StorageProjectCache};
use cadenza_preview::storage::{BackendKind, MemoryStorage, StorageBackend};
use cadenza_preview::{
    AuthNotice, AuthState, BrowserStorage, MemoryBackend, PreviewClientConfig, PreviewError,
    PreviewSession, ProjectOrigin, TrustLevel,
};

use common::sample_project;

fn config() -> PreviewClientConfig {
    PreviewClientConfig {
        site_url: "https://musica.example.com".into(),
        ..PreviewClientConfig::default()
    }
}

fn backend_with(project_id: &str) -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::default());
    backend.insert_project(sample_project(project_id));
    backend
}

#[tokio::test]
async fn first_visit_with_token_can_leave_feedback() {
    let backend = backend_with("P123");
    let token = backend.issue_token("P123", Duration::days(7));
    let storage = BrowserStorage::in_memory("https://musica.example.com");

    let session = PreviewSession::open("P123", Some(&token), &config(), storage.clone(), backend.clone())
        .await
        .unwrap();

    assert!(!session.is_degraded());
    assert_eq!(session.auth().trust(), Some(TrustLevel::BackendVerified));
    assert_eq!(storage.cookies.cookie(&access_key("P123")).unwrap().value, "true");

    let project = session
        .workflow()
        .submit_feedback("Gostei, mas quero mais violão", None)
        .await
        .unwrap();
    assert_eq!(project.status, ProjectStatus::Feedback);
    assert_eq!(project.feedback_history.len(), 1);
    assert_eq!(backend.project("P123").unwrap().status, ProjectStatus::Feedback);
}

#[tokio::test]
async fn returning_visitor_is_trusted_locally_only() {
    let backend = backend_with("P123");
    let storage = BrowserStorage::in_memory("https://musica.example.com");

    let first = PreviewSession::open("P123", None, &config(), storage.clone(), backend.clone())
        .await
        .unwrap();
    assert_eq!(first.auth().state(), AuthState::Unauthenticated);
    assert_eq!(
        first.auth().authenticate("ana@example.com").await,
        Ok(AuthNotice::MagicLinkSent)
    );

    let second = PreviewSession::open("P123", None, &config(), storage, backend.clone())
        .await
        .unwrap();
    assert_eq!(
        second.auth().state(),
        AuthState::Authenticated {
            email: Some("ana@example.com".into()),
            trust: TrustLevel::LocallyTrusted,
        }
    );
    let result = second.workflow().approve_version(Some("v2")).await;
    assert_matches!(result, Err(PreviewError::NotVerified));
    assert_eq!(backend.project("P123").unwrap().status, ProjectStatus::Waiting);
}

#[tokio::test]
async fn following_the_magic_link_verifies_the_visit() {
    let backend = backend_with("P123");
    let storage = BrowserStorage::in_memory("https://musica.example.com");

    let first = PreviewSession::open("P123", None, &config(), storage.clone(), backend.clone())
        .await
        .unwrap();
    first.auth().authenticate("ana@example.com").await.unwrap();
    assert_eq!(first.auth().trust(), Some(TrustLevel::LocallyTrusted));

    let (_, link) = backend.sent_magic_links().pop().unwrap();
    assert!(link.starts_with("https://musica.example.com/preview/P123?token="));

    let returned = PreviewSession::open(
        "P123",
        token_from_link(&link),
        &config(),
        storage,
        backend.clone(),
    )
    .await
    .unwrap();
    assert_eq!(returned.auth().trust(), Some(TrustLevel::BackendVerified));

    let approved = returned.workflow().approve_version(Some("v2")).await.unwrap();
    assert_eq!(approved.status, ProjectStatus::Approved);
    assert_eq!(backend.project("P123").unwrap().status, ProjectStatus::Approved);
}

#[tokio::test]
async fn approval_is_terminal() {
    let backend = backend_with("P123");
    let token = backend.issue_token("P123", Duration::days(7));
    let storage = BrowserStorage::in_memory("https://musica.example.com");
    let session = PreviewSession::open("P123", Some(&token), &config(), storage, backend.clone())
        .await
        .unwrap();

    session.workflow().submit_feedback("Mais grave", None).await.unwrap();
    let approved = session.workflow().approve_version(Some("v2")).await.unwrap();
    assert_eq!(approved.status, ProjectStatus::Approved);

    let again = session.workflow().approve_version(Some("v1")).await;
    assert_matches!(
        again,
        Err(PreviewError::Validation(ValidationError::AlreadyApproved))
    );
    assert!(!session.workflow().can_submit_feedback("Mudei de ideia"));
}

#[tokio::test]
async fn offline_backend_serves_cached_copy() {
    let backend = backend_with("P123");
    backend.set_reachable(false);
    let storage = BrowserStorage::in_memory("https://musica.example.com");
    StorageProjectCache::new(storage.persistent.clone()).put(&sample_project("P123"));

    let session = PreviewSession::open("P123", None, &config(), storage, backend)
        .await
        .unwrap();

    assert!(session.is_degraded());
    assert_eq!(session.workflow().loaded().origin, ProjectOrigin::Cache);
    assert_eq!(session.project().id, "P123");
}

#[tokio::test]
async fn offline_backend_without_cache_serves_demo() {
    let backend = backend_with("P123");
    backend.set_reachable(false);
    let storage = BrowserStorage::in_memory("https://musica.example.com");

    let session = PreviewSession::open("P123", None, &config(), storage, backend)
        .await
        .unwrap();

    assert!(session.is_degraded());
    assert!(session.project().is_demo());
    let result = session.workflow().submit_feedback("Mais grave", None).await;
    assert_matches!(result, Err(PreviewError::Degraded));
}

#[tokio::test]
async fn reload_recovers_once_backend_returns() {
    let backend = backend_with("P123");
    backend.set_reachable(false);
    let storage = BrowserStorage::in_memory("https://musica.example.com");
    let session = PreviewSession::open("P123", None, &config(), storage.clone(), backend.clone())
        .await
        .unwrap();
    assert!(session.is_degraded());

    backend.set_reachable(true);
    let loaded = session.reload().await;
    assert_eq!(loaded.origin, ProjectOrigin::Backend);
    assert!(!session.is_degraded());
    let persistent = storage.persistent.read(&cache_key("P123")).unwrap();
    assert!(persistent.is_some());
}

#[tokio::test]
async fn conflicting_write_then_reload() {
    let backend = backend_with("P123");
    let token = backend.issue_token("P123", Duration::days(7));
    let storage = BrowserStorage::in_memory("https://musica.example.com");
    let session = PreviewSession::open("P123", Some(&token), &config(), storage, backend.clone())
        .await
        .unwrap();

    backend.modify_project("P123", |p| p.title = "Atualizado pelo produtor".into());
    let result = session.workflow().submit_feedback("Mais grave", None).await;
    assert_matches!(result, Err(PreviewError::Conflict));

    session.reload().await;
    let project = session.workflow().submit_feedback("Mais grave", None).await.unwrap();
    assert_eq!(project.title, "Atualizado pelo produtor");
    assert_eq!(project.revision, 2);
}

#[tokio::test]
async fn private_browsing_keeps_grant_in_cookies() {
    let backend = backend_with("P123");
    let persistent = Arc::new(MemoryStorage::restricted(BackendKind::Persistent));
    let storage = BrowserStorage {
        persistent: persistent.clone(),
        ..BrowserStorage::in_memory("http://localhost:5173")
    };

    let first = PreviewSession::open("P123", None, &config(), storage.clone(), backend.clone())
        .await
        .unwrap();
    first.auth().authenticate("ana@example.com").await.unwrap();
    let reads = persistent.read_count();

    let second = PreviewSession::open("P123", None, &config(), storage, backend)
        .await
        .unwrap();
    assert!(second.auth().is_authenticated());
    assert_eq!(persistent.read_count(), reads);
}

#[tokio::test]
async fn invalid_project_id_is_rejected() {
    let backend = backend_with("P123");
    let storage = BrowserStorage::in_memory("https://musica.example.com");

    let result = PreviewSession::open("bad:id", None, &config(), storage, backend).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn second_email_replaces_first() {
    let backend = backend_with("P123");
    let storage = BrowserStorage::in_memory("https://musica.example.com");
    let session = PreviewSession::open("P123", None, &config(), storage, backend)
        .await
        .unwrap();

    session.auth().authenticate("b@x.com").await.unwrap();
    session.auth().authenticate("a@x.com").await.unwrap();
    assert_eq!(session.auth().email().as_deref(), Some("a@x.com"));
}
