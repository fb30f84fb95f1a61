//! Repository for the `feedback_entries` table.

use sqlx::{PgExecutor, PgPool};

use crate::models::feedback::{CreateFeedback, FeedbackRow};

const COLUMNS: &str = "id, project_id, content, version_id, decision, status, \
    client_name, client_email, created_at";

pub struct FeedbackRepo;

impl FeedbackRepo {
    /// Append an entry with status `pending`.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateFeedback,
    ) -> Result<FeedbackRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO feedback_entries
                (project_id, content, version_id, decision, client_name, client_email)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeedbackRow>(&query)
            .bind(&input.project_id)
            .bind(&input.content)
            .bind(&input.version_id)
            .bind(&input.decision)
            .bind(&input.client_name)
            .bind(&input.client_email)
            .fetch_one(executor)
            .await
    }

    /// A project's history, oldest first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: &str,
    ) -> Result<Vec<FeedbackRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM feedback_entries
             WHERE project_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, FeedbackRow>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Mark an entry as handled by the operator.
    pub async fn mark_processed(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE feedback_entries SET status = 'processed' \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
