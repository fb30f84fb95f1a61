//! Repository for the `access_logs` audit table.

use sqlx::PgPool;

use crate::models::access_log::{AccessLog, CreateAccessLog};

const COLUMNS: &str = "id, project_id, method, email, created_at";

pub struct AccessLogRepo;

impl AccessLogRepo {
    pub async fn create(pool: &PgPool, input: &CreateAccessLog) -> Result<AccessLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO access_logs (project_id, method, email)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccessLog>(&query)
            .bind(&input.project_id)
            .bind(&input.method)
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    /// Most recent first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: &str,
    ) -> Result<Vec<AccessLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM access_logs
             WHERE project_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, AccessLog>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }
}
