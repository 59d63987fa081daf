use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::pointsmodel::{LedgerDrift, PointsHistory};
use crate::models::taskmodel::TaskCompletion;

use super::profiledtos::FilterProfileDto;

#[derive(Serialize, Deserialize, Validate)]
pub struct RequestQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct AdminAdjustDto {
    #[validate(length(min = 20, max = 64, message = "Wallet address is required"))]
    pub wallet_address: String,

    #[validate(range(min = -1_000_000, max = 1_000_000, message = "Delta out of range"))]
    pub delta: i64,

    #[validate(length(min = 1, max = 255, message = "Description is required"))]
    pub description: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SweepScopeDto {
    pub wallet_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileListResponseDto {
    pub status: String,
    pub results: usize,
    pub total: i64,
    pub profiles: Vec<FilterProfileDto>,
}

#[derive(Debug, Serialize)]
pub struct ProfileDetailResponseDto {
    pub status: String,
    pub profile: FilterProfileDto,
    pub history: Vec<PointsHistory>,
    pub completions: Vec<TaskCompletion>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponseDto {
    pub status: String,
    pub results: usize,
    pub history: Vec<PointsHistory>,
}

/// Best-effort dashboard aggregates plus the ledger audit.
#[derive(Debug, Serialize)]
pub struct AdminStatsResponseDto {
    pub status: String,
    pub total_profiles: i64,
    pub total_points_outstanding: i64,
    pub active_completions: i64,
    pub total_referrals: i64,
    pub ledger_drift: Vec<LedgerDrift>,
}
