//! Repository tests against a live Postgres.
//!
//! Run with `DATABASE_URL` set and `--ignored`.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use cadenza_core::project::{FeedbackStatus, ProjectStatus};
use cadenza_db::models::access_log::CreateAccessLog;
use cadenza_db::models::feedback::CreateFeedback;
use cadenza_db::models::project::{StatusUpdate, UpsertProject};
use cadenza_db::models::version::UpsertVersion;
use cadenza_db::repositories::{AccessLogRepo, PreviewCodeRepo, ProjectRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_project(id: &str) -> UpsertProject {
    UpsertProject {
        id: id.to_string(),
        client_name: "Ana Souza".to_string(),
        client_email: "ana@example.com".to_string(),
        title: "Música de aniversário".to_string(),
        expires_at: None,
    }
}

fn new_version(id: &str, recommended: bool) -> UpsertVersion {
    UpsertVersion {
        id: id.to_string(),
        name: format!("Versão {id}"),
        description: None,
        audio_url: format!("https://cdn.cadenza.test/{id}.mp3"),
        recommended,
    }
}

async fn seed(pool: &PgPool, id: &str) {
    ProjectRepo::upsert_with_versions(
        pool,
        &new_project(id),
        &[new_version("v1", false), new_version("v2", true)],
    )
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn upsert_creates_aggregate(pool: PgPool) {
    seed(&pool, "P123").await;

    let project = ProjectRepo::load(&pool, "P123").await.unwrap().unwrap();
    assert_eq!(project.status, ProjectStatus::Waiting);
    assert_eq!(project.revision, 0);
    assert_eq!(
        project.versions.iter().map(|v| v.id.as_str()).collect::<Vec<_>>(),
        vec!["v1", "v2"]
    );
    assert_eq!(project.recommended_version().unwrap().id, "v2");
    assert!(project.feedback_history.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn upsert_refreshes_and_bumps_revision(pool: PgPool) {
    seed(&pool, "P123").await;

    let mut input = new_project("P123");
    input.title = "Nova letra".to_string();
    let row = ProjectRepo::upsert_with_versions(&pool, &input, &[new_version("v3", false)])
        .await
        .unwrap();

    assert_eq!(row.title, "Nova letra");
    assert_eq!(row.revision, 1);
    let project = ProjectRepo::load(&pool, "P123").await.unwrap().unwrap();
    assert_eq!(project.versions.len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn load_missing_project_is_none(pool: PgPool) {
    assert!(ProjectRepo::load(&pool, "nope").await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn status_update_appends_history(pool: PgPool) {
    seed(&pool, "P123").await;

    let update = StatusUpdate {
        project_id: "P123".into(),
        expected_revision: 0,
        status: ProjectStatus::Feedback,
        feedback: Some(CreateFeedback {
            project_id: "P123".into(),
            content: "Gostei, mas quero mais violão".into(),
            version_id: None,
            decision: "feedback".into(),
            client_name: Some("Ana Souza".into()),
            client_email: Some("ana@example.com".into()),
        }),
    };
    let row = ProjectRepo::apply_status_update(&pool, &update)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "feedback");
    assert_eq!(row.revision, 1);

    let project = ProjectRepo::load(&pool, "P123").await.unwrap().unwrap();
    assert_eq!(project.feedback_history.len(), 1);
    assert_eq!(project.feedback_history[0].status, FeedbackStatus::Pending);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn stale_revision_writes_nothing(pool: PgPool) {
    seed(&pool, "P123").await;

    let update = StatusUpdate {
        project_id: "P123".into(),
        expected_revision: 5,
        status: ProjectStatus::Approved,
        feedback: None,
    };
    let result = ProjectRepo::apply_status_update(&pool, &update).await.unwrap();
    assert!(result.is_none());

    let project = ProjectRepo::load(&pool, "P123").await.unwrap().unwrap();
    assert_eq!(project.status, ProjectStatus::Waiting);
    assert_eq!(project.revision, 0);
}

// ---------------------------------------------------------------------------
// Preview codes and access logs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn issuing_a_code_deactivates_older_ones(pool: PgPool) {
    seed(&pool, "P123").await;
    let expires = Utc::now() + Duration::days(7);

    PreviewCodeRepo::issue(&pool, "P123", "first", expires).await.unwrap();
    PreviewCodeRepo::issue(&pool, "P123", "second", expires).await.unwrap();

    let first = PreviewCodeRepo::find_by_code(&pool, "first").await.unwrap().unwrap();
    let second = PreviewCodeRepo::find_by_code(&pool, "second").await.unwrap().unwrap();
    assert!(!first.is_active);
    assert!(second.is_usable_at(Utc::now()));

    let revoked = PreviewCodeRepo::deactivate_for_project(&pool, "P123").await.unwrap();
    assert_eq!(revoked, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn usable_code_lookup_skips_expired_and_revoked(pool: PgPool) {
    seed(&pool, "P123").await;
    let now = Utc::now();

    PreviewCodeRepo::issue(&pool, "P123", "stale", now - Duration::hours(1)).await.unwrap();
    assert!(PreviewCodeRepo::find_usable_for_project(&pool, "P123", now)
        .await
        .unwrap()
        .is_none());

    PreviewCodeRepo::issue(&pool, "P123", "fresh", now + Duration::days(7)).await.unwrap();
    let usable = PreviewCodeRepo::find_usable_for_project(&pool, "P123", now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(usable.code, "fresh");

    PreviewCodeRepo::deactivate_for_project(&pool, "P123").await.unwrap();
    assert!(PreviewCodeRepo::find_usable_for_project(&pool, "P123", now)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn access_logs_are_listed_newest_first(pool: PgPool) {
    for method in ["notification", "token"] {
        AccessLogRepo::create(
            &pool,
            &CreateAccessLog {
                project_id: "P123".into(),
                method: method.into(),
                email: Some("ana@example.com".into()),
            },
        )
        .await
        .unwrap();
    }

    let logs = AccessLogRepo::list_for_project(&pool, "P123").await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].method, "token");
}
