//! Repository for the `preview_codes` table.

use sqlx::PgPool;

use cadenza_core::types::Timestamp;

use crate::models::preview_code::PreviewCode;

const COLUMNS: &str = "id, code, project_id, is_active, expires_at, created_at";

pub struct PreviewCodeRepo;

impl PreviewCodeRepo {
    /// Store a newly minted code, deactivating every older code of the project.
    pub async fn issue(
        pool: &PgPool,
        project_id: &str,
        code: &str,
        expires_at: Timestamp,
    ) -> Result<PreviewCode, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE preview_codes SET is_active = false \
             WHERE project_id = $1 AND is_active = true",
        )
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO preview_codes (code, project_id, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let issued = sqlx::query_as::<_, PreviewCode>(&query)
            .bind(code)
            .bind(project_id)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(issued)
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<PreviewCode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM preview_codes WHERE code = $1");
        sqlx::query_as::<_, PreviewCode>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// The newest active, unexpired code of a project.
    pub async fn find_usable_for_project(
        pool: &PgPool,
        project_id: &str,
        now: Timestamp,
    ) -> Result<Option<PreviewCode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM preview_codes
             WHERE project_id = $1 AND is_active = true AND expires_at > $2
             ORDER BY created_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, PreviewCode>(&query)
            .bind(project_id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Deactivate all codes of a project. Returns how many were active.
    pub async fn deactivate_for_project(pool: &PgPool, project_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE preview_codes SET is_active = false \
             WHERE project_id = $1 AND is_active = true",
        )
        .bind(project_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
