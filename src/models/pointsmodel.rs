use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    ConnectBonus,
    XConnect,
    XDisconnect,
    DiscordConnect,
    DiscordDisconnect,
    DiscordVerify,
    DiscordVerifyRevoked,
    DailyPost,
    DailyPostRevoked,
    ReferralBonus,
    AdminAdjustment,
}

impl TransactionType {
    pub fn to_str(&self) -> &str {
        match self {
            TransactionType::ConnectBonus => "connect_bonus",
            TransactionType::XConnect => "x_connect",
            TransactionType::XDisconnect => "x_disconnect",
            TransactionType::DiscordConnect => "discord_connect",
            TransactionType::DiscordDisconnect => "discord_disconnect",
            TransactionType::DiscordVerify => "discord_verify",
            TransactionType::DiscordVerifyRevoked => "discord_verify_revoked",
            TransactionType::DailyPost => "daily_post",
            TransactionType::DailyPostRevoked => "daily_post_revoked",
            TransactionType::ReferralBonus => "referral_bonus",
            TransactionType::AdminAdjustment => "admin_adjustment",
        }
    }
}

/// One row per balance mutation. Written only by the points engine and
/// never updated or deleted afterwards.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct PointsHistory {
    pub id: Uuid,
    pub wallet_address: String,
    pub transaction_type: TransactionType,
    pub points_change: i64,
    pub balance_after: i64,
    pub description: String,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Admin audit row: a wallet whose stored total has drifted from the sum
/// of its ledger entries.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct LedgerDrift {
    pub wallet_address: String,
    pub total_points: i64,
    pub history_sum: i64,
}
