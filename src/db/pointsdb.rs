// db/pointsdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use super::store::{PointsStore, StoreError};
use crate::models::pointsmodel::{LedgerDrift, PointsHistory, TransactionType};

#[async_trait]
impl PointsStore for DBClient {
    async fn adjust_points(
        &self,
        wallet: &str,
        delta: i64,
        transaction_type: TransactionType,
        description: &str,
    ) -> Result<i64, StoreError> {
        // The total update and the history append commit together or not
        // at all. Concurrent writers serialize on the row update, so the
        // RETURNING value is the balance this entry produced.
        let mut tx = self.pool.begin().await?;

        let new_balance: i64 = sqlx::query_scalar(
            r#"
            UPDATE wallet_profiles
            SET total_points = total_points + $2,
                updated_at = NOW()
            WHERE wallet_address = $1
            RETURNING total_points
            "#,
        )
        .bind(wallet)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        sqlx::query(
            r#"
            INSERT INTO points_history
                (id, wallet_address, transaction_type, points_change, balance_after, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(wallet)
        .bind(transaction_type)
        .bind(delta)
        .bind(new_balance)
        .bind(description)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(new_balance)
    }

    async fn latest_positive_amount(
        &self,
        wallet: &str,
        transaction_type: TransactionType,
    ) -> Result<Option<i64>, StoreError> {
        let amount: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT points_change
            FROM points_history
            WHERE wallet_address = $1
              AND transaction_type = $2
              AND points_change > 0
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(wallet)
        .bind(transaction_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(amount)
    }

    async fn history_for(
        &self,
        wallet: &str,
        page: u32,
        limit: usize,
    ) -> Result<Vec<PointsHistory>, StoreError> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let entries = sqlx::query_as::<_, PointsHistory>(
            r#"
            SELECT id, wallet_address, transaction_type, points_change,
                   balance_after, description, created_at
            FROM points_history
            WHERE wallet_address = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(wallet)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn history_sum(&self, wallet: &str) -> Result<i64, StoreError> {
        let sum: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(points_change), 0)::bigint
            FROM points_history
            WHERE wallet_address = $1
            "#,
        )
        .bind(wallet)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    async fn total_points_outstanding(&self) -> Result<i64, StoreError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(total_points), 0)::bigint FROM wallet_profiles")
                .fetch_one(&self.pool)
                .await?;

        Ok(total)
    }

    async fn ledger_drift(&self) -> Result<Vec<LedgerDrift>, StoreError> {
        let rows = sqlx::query_as::<_, LedgerDrift>(
            r#"
            SELECT p.wallet_address,
                   p.total_points,
                   COALESCE(SUM(h.points_change), 0)::bigint AS history_sum
            FROM wallet_profiles p
            LEFT JOIN points_history h ON h.wallet_address = p.wallet_address
            GROUP BY p.wallet_address, p.total_points
            HAVING p.total_points <> COALESCE(SUM(h.points_change), 0)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
