// handler/points.rs
use std::sync::Arc;

use axum::{
    extract::Query,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::store::{PointsStore, ProfileStore},
    dtos::{
        admindtos::{HistoryResponseDto, RequestQueryDto},
        profiledtos::{FilterProfileDto, LeaderboardResponseDto},
    },
    error::HttpError,
    middleware::WalletIdentity,
    AppState,
};

const LEADERBOARD_LIMIT: i64 = 100;

pub fn points_handler() -> Router {
    Router::new().route("/history", get(get_history))
}

pub async fn get_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(wallet): Extension<WalletIdentity>,
    Query(query): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query.page.unwrap_or(1) as u32;
    let limit = query.limit.unwrap_or(20);

    let history = app_state
        .store
        .history_for(&wallet.address, page, limit)
        .await?;

    Ok(Json(HistoryResponseDto {
        status: "success".to_string(),
        results: history.len(),
        history,
    }))
}

/// Public: no wallet identity required.
pub async fn get_leaderboard(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let profiles = app_state.store.leaderboard(LEADERBOARD_LIMIT).await?;
    let leaderboard: Vec<FilterProfileDto> =
        profiles.iter().map(FilterProfileDto::filter_profile).collect();

    Ok(Json(LeaderboardResponseDto {
        status: "success".to_string(),
        results: leaderboard.len(),
        leaderboard,
    }))
}
