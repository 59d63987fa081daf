// db/referraldb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::{DBClient, REFERRAL_COLUMNS};
use super::store::{NewReferral, ReferralStore, StoreError};
use crate::models::referralmodel::Referral;

#[async_trait]
impl ReferralStore for DBClient {
    async fn insert_referral(&self, referral: NewReferral) -> Result<Referral, StoreError> {
        let row = sqlx::query_as::<_, Referral>(&format!(
            r#"
            INSERT INTO referrals
                (id, referrer_wallet, referred_wallet, referral_code,
                 referrer_points, referred_points)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {REFERRAL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&referral.referrer_wallet)
        .bind(&referral.referred_wallet)
        .bind(&referral.referral_code)
        .bind(referral.referrer_points)
        .bind(referral.referred_points)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_referral_by_referred(
        &self,
        wallet: &str,
    ) -> Result<Option<Referral>, StoreError> {
        let referral = sqlx::query_as::<_, Referral>(&format!(
            r#"
            SELECT {REFERRAL_COLUMNS}
            FROM referrals
            WHERE referred_wallet = $1
            "#
        ))
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await?;

        Ok(referral)
    }

    async fn mark_referral_claimed(&self, id: Uuid) -> Result<Option<Referral>, StoreError> {
        let referral = sqlx::query_as::<_, Referral>(&format!(
            r#"
            UPDATE referrals
            SET referrer_claimed = TRUE,
                referred_claimed = TRUE,
                claimed_at = NOW()
            WHERE id = $1 AND referred_claimed = FALSE
            RETURNING {REFERRAL_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(referral)
    }

    async fn list_referrals_by_referrer(
        &self,
        wallet: &str,
    ) -> Result<Vec<Referral>, StoreError> {
        let referrals = sqlx::query_as::<_, Referral>(&format!(
            r#"
            SELECT {REFERRAL_COLUMNS}
            FROM referrals
            WHERE referrer_wallet = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(wallet)
        .fetch_all(&self.pool)
        .await?;

        Ok(referrals)
    }

    async fn count_referrals(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM referrals")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
