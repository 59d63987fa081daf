// db/taskdb.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::db::{COMPLETION_COLUMNS, DBClient};
use super::store::{NewCompletion, StoreError, TaskStore};
use crate::models::taskmodel::{TaskCompletion, TaskType};

#[async_trait]
impl TaskStore for DBClient {
    async fn find_active_completion(
        &self,
        wallet: &str,
        task_type: TaskType,
        date: Option<NaiveDate>,
    ) -> Result<Option<TaskCompletion>, StoreError> {
        let completion = sqlx::query_as::<_, TaskCompletion>(&format!(
            r#"
            SELECT {COMPLETION_COLUMNS}
            FROM task_completions
            WHERE wallet_address = $1
              AND task_type = $2
              AND status = 'active'
              AND ($3::date IS NULL OR completion_date = $3)
            ORDER BY completed_at DESC
            LIMIT 1
            "#
        ))
        .bind(wallet)
        .bind(task_type)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(completion)
    }

    async fn insert_completion(
        &self,
        completion: NewCompletion,
    ) -> Result<TaskCompletion, StoreError> {
        let row = sqlx::query_as::<_, TaskCompletion>(&format!(
            r#"
            INSERT INTO task_completions
                (id, wallet_address, task_type, points_awarded, completion_date, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COMPLETION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&completion.wallet_address)
        .bind(completion.task_type)
        .bind(completion.points_awarded)
        .bind(completion.completion_date)
        .bind(completion.metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_completion(&self, id: Uuid) -> Result<Option<TaskCompletion>, StoreError> {
        let completion = sqlx::query_as::<_, TaskCompletion>(&format!(
            r#"
            SELECT {COMPLETION_COLUMNS}
            FROM task_completions
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(completion)
    }

    async fn mark_revoked(&self, id: Uuid) -> Result<Option<TaskCompletion>, StoreError> {
        // Guarded on status so a concurrent revoke can win at most once.
        let completion = sqlx::query_as::<_, TaskCompletion>(&format!(
            r#"
            UPDATE task_completions
            SET status = 'revoked',
                revoked_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING {COMPLETION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(completion)
    }

    async fn list_completions(
        &self,
        wallet: &str,
        page: u32,
        limit: usize,
    ) -> Result<Vec<TaskCompletion>, StoreError> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let completions = sqlx::query_as::<_, TaskCompletion>(&format!(
            r#"
            SELECT {COMPLETION_COLUMNS}
            FROM task_completions
            WHERE wallet_address = $1
            ORDER BY completed_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(wallet)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(completions)
    }

    async fn list_active_with_metadata(
        &self,
        wallet: Option<&str>,
        task_type: TaskType,
    ) -> Result<Vec<TaskCompletion>, StoreError> {
        let completions = sqlx::query_as::<_, TaskCompletion>(&format!(
            r#"
            SELECT {COMPLETION_COLUMNS}
            FROM task_completions
            WHERE task_type = $1
              AND status = 'active'
              AND metadata IS NOT NULL
              AND ($2::text IS NULL OR wallet_address = $2)
            ORDER BY completed_at ASC
            "#
        ))
        .bind(task_type)
        .bind(wallet)
        .fetch_all(&self.pool)
        .await?;

        Ok(completions)
    }

    async fn count_active_completions(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM task_completions WHERE status = 'active'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
