use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::referralmodel::Referral;
use crate::service::referral_service::ReferralStats;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ApplyReferralDto {
    #[validate(length(min = 8, max = 8, message = "Referral code must be 8 characters"))]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ReferralResponseDto {
    pub status: String,
    pub message: String,
    pub data: Referral,
}

#[derive(Debug, Serialize)]
pub struct ReferralStatsDto {
    pub referral_code: Option<String>,
    pub referral_count: i32,
    pub referral_points_earned: i64,
    pub tier: String,
    pub referrals: Vec<Referral>,
}

impl From<ReferralStats> for ReferralStatsDto {
    fn from(stats: ReferralStats) -> Self {
        ReferralStatsDto {
            referral_code: stats.referral_code,
            referral_count: stats.referral_count,
            referral_points_earned: stats.referral_points_earned,
            tier: stats.tier.to_str().to_string(),
            referrals: stats.referrals,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReferralStatsResponseDto {
    pub status: String,
    pub data: ReferralStatsDto,
}
