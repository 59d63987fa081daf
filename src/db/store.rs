// db/store.rs
//
// Storage port for the ledger. Two implementations: DBClient (Postgres via
// sqlx, split across the sibling *db.rs files) and MemStore (db/memory.rs,
// used by service tests).
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    pointsmodel::{LedgerDrift, PointsHistory, TransactionType},
    profilemodel::{ChainType, Platform, PlatformIdentity, WalletProfile},
    referralmodel::Referral,
    taskmodel::{TaskCompletion, TaskType},
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("unique constraint violated")]
    Conflict,

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

#[async_trait]
pub trait ProfileStore {
    async fn get_profile(&self, wallet: &str) -> Result<Option<WalletProfile>, StoreError>;

    async fn get_or_create_profile(
        &self,
        wallet: &str,
        chain: ChainType,
    ) -> Result<WalletProfile, StoreError>;

    /// Connect with `Some(identity)`, disconnect with `None`. Disconnecting
    /// Discord also clears the verified flag and timestamp.
    async fn set_platform_connection(
        &self,
        wallet: &str,
        platform: Platform,
        identity: Option<PlatformIdentity>,
    ) -> Result<WalletProfile, StoreError>;

    async fn set_discord_verified(
        &self,
        wallet: &str,
        verified: bool,
    ) -> Result<WalletProfile, StoreError>;

    async fn set_connect_bonus_claimed(&self, wallet: &str)
        -> Result<WalletProfile, StoreError>;

    /// Fails with `Conflict` when the code is already taken, and with
    /// `Conflict` when the wallet already holds a code. A code is issued
    /// at most once.
    async fn assign_referral_code(
        &self,
        wallet: &str,
        code: &str,
    ) -> Result<WalletProfile, StoreError>;

    /// Set-once; `Conflict` when a code was already applied.
    async fn set_referred_by(&self, wallet: &str, code: &str)
        -> Result<WalletProfile, StoreError>;

    async fn set_referral_aggregates(
        &self,
        wallet: &str,
        count: i32,
        points_earned: i64,
    ) -> Result<WalletProfile, StoreError>;

    async fn get_profile_by_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<WalletProfile>, StoreError>;

    async fn list_profiles(
        &self,
        page: u32,
        limit: usize,
    ) -> Result<Vec<WalletProfile>, StoreError>;

    async fn count_profiles(&self) -> Result<i64, StoreError>;

    async fn list_discord_verified(&self) -> Result<Vec<WalletProfile>, StoreError>;

    async fn leaderboard(&self, limit: i64) -> Result<Vec<WalletProfile>, StoreError>;
}

#[async_trait]
pub trait PointsStore {
    /// The ledger primitive: increment the stored total and append one
    /// history row as a single atomic operation. The profile must exist.
    async fn adjust_points(
        &self,
        wallet: &str,
        delta: i64,
        transaction_type: TransactionType,
        description: &str,
    ) -> Result<i64, StoreError>;

    /// Most recent positive entry of the given type, for exact refunds.
    async fn latest_positive_amount(
        &self,
        wallet: &str,
        transaction_type: TransactionType,
    ) -> Result<Option<i64>, StoreError>;

    async fn history_for(
        &self,
        wallet: &str,
        page: u32,
        limit: usize,
    ) -> Result<Vec<PointsHistory>, StoreError>;

    async fn history_sum(&self, wallet: &str) -> Result<i64, StoreError>;

    async fn total_points_outstanding(&self) -> Result<i64, StoreError>;

    /// Wallets whose stored total disagrees with the sum of their ledger
    /// entries. Empty under normal operation.
    async fn ledger_drift(&self) -> Result<Vec<LedgerDrift>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct NewCompletion {
    pub wallet_address: String,
    pub task_type: TaskType,
    pub points_awarded: i64,
    pub completion_date: NaiveDate,
    pub metadata: Option<serde_json::Value>,
}

#[async_trait]
pub trait TaskStore {
    async fn find_active_completion(
        &self,
        wallet: &str,
        task_type: TaskType,
        date: Option<NaiveDate>,
    ) -> Result<Option<TaskCompletion>, StoreError>;

    async fn insert_completion(
        &self,
        completion: NewCompletion,
    ) -> Result<TaskCompletion, StoreError>;

    async fn get_completion(&self, id: Uuid) -> Result<Option<TaskCompletion>, StoreError>;

    /// Flips an active completion to revoked. Returns `None` when the row
    /// exists but is no longer active (lost race or repeat call).
    async fn mark_revoked(&self, id: Uuid) -> Result<Option<TaskCompletion>, StoreError>;

    async fn list_completions(
        &self,
        wallet: &str,
        page: u32,
        limit: usize,
    ) -> Result<Vec<TaskCompletion>, StoreError>;

    /// Active completions of the type that carry metadata, optionally
    /// scoped to one wallet. Sweep input.
    async fn list_active_with_metadata(
        &self,
        wallet: Option<&str>,
        task_type: TaskType,
    ) -> Result<Vec<TaskCompletion>, StoreError>;

    async fn count_active_completions(&self) -> Result<i64, StoreError>;
}

#[derive(Debug, Clone)]
pub struct NewReferral {
    pub referrer_wallet: String,
    pub referred_wallet: String,
    pub referral_code: String,
    pub referrer_points: i64,
    pub referred_points: i64,
}

#[async_trait]
pub trait ReferralStore {
    /// `Conflict` when the referred wallet already has an edge.
    async fn insert_referral(&self, referral: NewReferral) -> Result<Referral, StoreError>;

    async fn get_referral_by_referred(
        &self,
        wallet: &str,
    ) -> Result<Option<Referral>, StoreError>;

    /// Marks both claimed flags. Returns `None` when already claimed.
    async fn mark_referral_claimed(&self, id: Uuid) -> Result<Option<Referral>, StoreError>;

    async fn list_referrals_by_referrer(
        &self,
        wallet: &str,
    ) -> Result<Vec<Referral>, StoreError>;

    async fn count_referrals(&self) -> Result<i64, StoreError>;
}

pub trait LedgerStore:
    ProfileStore + PointsStore + TaskStore + ReferralStore + Send + Sync
{
}

impl<T> LedgerStore for T where
    T: ProfileStore + PointsStore + TaskStore + ReferralStore + Send + Sync
{
}
