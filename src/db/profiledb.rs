// db/profiledb.rs
use async_trait::async_trait;

use super::db::{DBClient, PROFILE_COLUMNS};
use super::store::{ProfileStore, StoreError};
use crate::models::profilemodel::{ChainType, Platform, PlatformIdentity, WalletProfile};

#[async_trait]
impl ProfileStore for DBClient {
    async fn get_profile(&self, wallet: &str) -> Result<Option<WalletProfile>, StoreError> {
        let profile = sqlx::query_as::<_, WalletProfile>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM wallet_profiles
            WHERE wallet_address = $1
            "#
        ))
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn get_or_create_profile(
        &self,
        wallet: &str,
        chain: ChainType,
    ) -> Result<WalletProfile, StoreError> {
        let profile = sqlx::query_as::<_, WalletProfile>(&format!(
            r#"
            INSERT INTO wallet_profiles (wallet_address, chain_type)
            VALUES ($1, $2)
            ON CONFLICT (wallet_address) DO UPDATE SET wallet_address = EXCLUDED.wallet_address
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(wallet)
        .bind(chain)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn set_platform_connection(
        &self,
        wallet: &str,
        platform: Platform,
        identity: Option<PlatformIdentity>,
    ) -> Result<WalletProfile, StoreError> {
        let (username, external_id) = match &identity {
            Some(id) => (Some(id.username.clone()), Some(id.external_id.clone())),
            None => (None, None),
        };
        let connected = identity.is_some();

        let query = match platform {
            Platform::X => format!(
                r#"
                UPDATE wallet_profiles
                SET x_connected = $2,
                    x_username = $3,
                    x_id = $4,
                    x_connected_at = CASE WHEN $2 THEN NOW() ELSE NULL END,
                    updated_at = NOW()
                WHERE wallet_address = $1
                RETURNING {PROFILE_COLUMNS}
                "#
            ),
            Platform::Discord => format!(
                r#"
                UPDATE wallet_profiles
                SET discord_connected = $2,
                    discord_username = $3,
                    discord_id = $4,
                    discord_connected_at = CASE WHEN $2 THEN NOW() ELSE NULL END,
                    discord_verified = CASE WHEN $2 THEN discord_verified ELSE FALSE END,
                    discord_verified_at = CASE WHEN $2 THEN discord_verified_at ELSE NULL END,
                    updated_at = NOW()
                WHERE wallet_address = $1
                RETURNING {PROFILE_COLUMNS}
                "#
            ),
        };

        let profile = sqlx::query_as::<_, WalletProfile>(&query)
            .bind(wallet)
            .bind(connected)
            .bind(username)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(profile)
    }

    async fn set_discord_verified(
        &self,
        wallet: &str,
        verified: bool,
    ) -> Result<WalletProfile, StoreError> {
        let profile = sqlx::query_as::<_, WalletProfile>(&format!(
            r#"
            UPDATE wallet_profiles
            SET discord_verified = $2,
                discord_verified_at = CASE WHEN $2 THEN NOW() ELSE NULL END,
                updated_at = NOW()
            WHERE wallet_address = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(wallet)
        .bind(verified)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(profile)
    }

    async fn set_connect_bonus_claimed(
        &self,
        wallet: &str,
    ) -> Result<WalletProfile, StoreError> {
        let profile = sqlx::query_as::<_, WalletProfile>(&format!(
            r#"
            UPDATE wallet_profiles
            SET connect_bonus_claimed = TRUE,
                updated_at = NOW()
            WHERE wallet_address = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(profile)
    }

    async fn assign_referral_code(
        &self,
        wallet: &str,
        code: &str,
    ) -> Result<WalletProfile, StoreError> {
        // The WHERE guard keeps an existing code from ever being replaced;
        // zero rows on an already-coded wallet surfaces as Conflict.
        let profile = sqlx::query_as::<_, WalletProfile>(&format!(
            r#"
            UPDATE wallet_profiles
            SET referral_code = $2,
                updated_at = NOW()
            WHERE wallet_address = $1 AND referral_code IS NULL
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(wallet)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match profile {
            Some(profile) => Ok(profile),
            None => match self.get_profile(wallet).await? {
                Some(_) => Err(StoreError::Conflict),
                None => Err(StoreError::NotFound),
            },
        }
    }

    async fn set_referred_by(
        &self,
        wallet: &str,
        code: &str,
    ) -> Result<WalletProfile, StoreError> {
        let profile = sqlx::query_as::<_, WalletProfile>(&format!(
            r#"
            UPDATE wallet_profiles
            SET referred_by = $2,
                updated_at = NOW()
            WHERE wallet_address = $1 AND referred_by IS NULL
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(wallet)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match profile {
            Some(profile) => Ok(profile),
            None => match self.get_profile(wallet).await? {
                Some(_) => Err(StoreError::Conflict),
                None => Err(StoreError::NotFound),
            },
        }
    }

    async fn set_referral_aggregates(
        &self,
        wallet: &str,
        count: i32,
        points_earned: i64,
    ) -> Result<WalletProfile, StoreError> {
        let profile = sqlx::query_as::<_, WalletProfile>(&format!(
            r#"
            UPDATE wallet_profiles
            SET referral_count = $2,
                referral_points_earned = $3,
                updated_at = NOW()
            WHERE wallet_address = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(wallet)
        .bind(count)
        .bind(points_earned)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(profile)
    }

    async fn get_profile_by_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<WalletProfile>, StoreError> {
        let profile = sqlx::query_as::<_, WalletProfile>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM wallet_profiles
            WHERE UPPER(referral_code) = UPPER($1)
            "#
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn list_profiles(
        &self,
        page: u32,
        limit: usize,
    ) -> Result<Vec<WalletProfile>, StoreError> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let profiles = sqlx::query_as::<_, WalletProfile>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM wallet_profiles
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    async fn count_profiles(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wallet_profiles")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_discord_verified(&self) -> Result<Vec<WalletProfile>, StoreError> {
        let profiles = sqlx::query_as::<_, WalletProfile>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM wallet_profiles
            WHERE discord_verified = TRUE AND discord_id IS NOT NULL
            ORDER BY discord_verified_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<WalletProfile>, StoreError> {
        let profiles = sqlx::query_as::<_, WalletProfile>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM wallet_profiles
            ORDER BY total_points DESC, created_at ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }
}
