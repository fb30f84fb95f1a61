//! Repository for the `projects` table and the project aggregate.

use sqlx::PgPool;

use cadenza_core::project::{FeedbackEntry, Project, Version};

use crate::models::project::{ProjectRow, StatusUpdate, UpsertProject};
use crate::models::version::UpsertVersion;
use crate::repositories::{FeedbackRepo, VersionRepo};

const COLUMNS: &str = "id, client_name, client_email, title, status, revision, \
    created_at, expires_at, last_activity_at, updated_at";

pub struct ProjectRepo;

impl ProjectRepo {
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load the full aggregate: project, versions and feedback history.
    pub async fn load(pool: &PgPool, id: &str) -> Result<Option<Project>, sqlx::Error> {
        let Some(row) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        Self::assemble(pool, row).await.map(Some)
    }

    /// Assemble the aggregate for an already fetched row.
    pub async fn assemble(pool: &PgPool, row: ProjectRow) -> Result<Project, sqlx::Error> {
        let versions: Vec<Version> = VersionRepo::list_for_project(pool, &row.id)
            .await?
            .into_iter()
            .map(Version::from)
            .collect();

        let feedback = FeedbackRepo::list_for_project(pool, &row.id)
            .await?
            .into_iter()
            .map(FeedbackEntry::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        row.into_project(versions, feedback)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))
    }

    /// Create the project or refresh its client details, then upsert
    /// `versions` in order. One transaction; bumps `revision` on update.
    pub async fn upsert_with_versions(
        pool: &PgPool,
        input: &UpsertProject,
        versions: &[UpsertVersion],
    ) -> Result<ProjectRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO projects (id, client_name, client_email, title, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET
                client_name = EXCLUDED.client_name,
                client_email = EXCLUDED.client_email,
                title = EXCLUDED.title,
                expires_at = EXCLUDED.expires_at,
                revision = projects.revision + 1,
                last_activity_at = now(),
                updated_at = now()
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&query)
            .bind(&input.id)
            .bind(&input.client_name)
            .bind(&input.client_email)
            .bind(&input.title)
            .bind(input.expires_at)
            .fetch_one(&mut *tx)
            .await?;

        for (position, version) in versions.iter().enumerate() {
            let position = i32::try_from(position).unwrap_or(i32::MAX);
            VersionRepo::upsert(&mut *tx, &row.id, position, version).await?;
        }

        tx.commit().await?;
        Ok(row)
    }

    /// Apply a status change if the stored revision still matches, appending
    /// the optional history entry in the same transaction.
    ///
    /// Returns `None` when the project is missing or the revision moved on;
    /// nothing is written in that case.
    pub async fn apply_status_update(
        pool: &PgPool,
        update: &StatusUpdate,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE projects SET
                status = $3,
                revision = revision + 1,
                last_activity_at = now(),
                updated_at = now()
             WHERE id = $1 AND revision = $2
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&query)
            .bind(&update.project_id)
            .bind(update.expected_revision)
            .bind(update.status.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        if let Some(feedback) = &update.feedback {
            FeedbackRepo::create(&mut *tx, feedback).await?;
        }

        tx.commit().await?;
        Ok(Some(row))
    }
}
