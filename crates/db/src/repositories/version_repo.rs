//! Repository for the `project_versions` table.

use sqlx::{PgExecutor, PgPool};

use crate::models::version::{UpsertVersion, VersionRow};

const COLUMNS: &str =
    "project_id, id, name, description, audio_url, recommended, position, created_at";

pub struct VersionRepo;

impl VersionRepo {
    /// List a project's versions in presentation order.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: &str,
    ) -> Result<Vec<VersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_versions
             WHERE project_id = $1
             ORDER BY position ASC, id ASC"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Insert or update one version at `position`.
    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: &str,
        position: i32,
        input: &UpsertVersion,
    ) -> Result<VersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_versions
                (project_id, id, name, description, audio_url, recommended, position)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (project_id, id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                audio_url = EXCLUDED.audio_url,
                recommended = EXCLUDED.recommended,
                position = EXCLUDED.position
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(project_id)
            .bind(&input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.audio_url)
            .bind(input.recommended)
            .bind(position)
            .fetch_one(executor)
            .await
    }
}
