use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    profilemodel::{ChainType, WalletProfile},
    referralmodel::tier_of,
};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ConnectPlatformDto {
    #[validate(length(min = 1, max = 100, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, max = 100, message = "External account id is required"))]
    pub external_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterProfileDto {
    pub wallet_address: String,
    pub chain_type: ChainType,
    pub total_points: i64,
    pub connect_bonus_claimed: bool,
    pub x_connected: bool,
    pub x_username: Option<String>,
    pub discord_connected: bool,
    pub discord_username: Option<String>,
    pub discord_verified: bool,
    pub referral_code: Option<String>,
    pub referred_by: Option<String>,
    pub referral_count: i32,
    pub referral_points_earned: i64,
    pub tier: String,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FilterProfileDto {
    pub fn filter_profile(profile: &WalletProfile) -> Self {
        FilterProfileDto {
            wallet_address: profile.wallet_address.clone(),
            chain_type: profile.chain_type,
            total_points: profile.total_points,
            connect_bonus_claimed: profile.connect_bonus_claimed,
            x_connected: profile.x_connected,
            x_username: profile.x_username.clone(),
            discord_connected: profile.discord_connected,
            discord_username: profile.discord_username.clone(),
            discord_verified: profile.discord_verified,
            referral_code: profile.referral_code.clone(),
            referred_by: profile.referred_by.clone(),
            referral_count: profile.referral_count,
            referral_points_earned: profile.referral_points_earned,
            tier: tier_of(profile.referral_count).to_str().to_string(),
            created_at: profile.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponseDto {
    pub status: String,
    pub data: FilterProfileDto,
}

/// Response for every profile mutation: the message, the resulting
/// balance, and the fresh profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileMutationResponseDto {
    pub status: String,
    pub message: String,
    pub balance: i64,
    pub data: FilterProfileDto,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponseDto {
    pub status: String,
    pub results: usize,
    pub leaderboard: Vec<FilterProfileDto>,
}
