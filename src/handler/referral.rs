// handler/referral.rs
use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::referraldtos::*,
    error::HttpError,
    middleware::WalletIdentity,
    AppState,
};

pub fn referral_handler() -> Router {
    Router::new()
        .route("/apply", post(apply_referral_code))
        .route("/stats", get(get_referral_stats))
}

pub async fn apply_referral_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(wallet): Extension<WalletIdentity>,
    Json(body): Json<ApplyReferralDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let referral = app_state
        .referrals
        .apply_referral_code(&wallet.address, &body.code)
        .await?;

    Ok(Json(ReferralResponseDto {
        status: "success".to_string(),
        message: "Referral code applied".to_string(),
        data: referral,
    }))
}

pub async fn get_referral_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(wallet): Extension<WalletIdentity>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.referrals.referral_stats(&wallet.address).await?;

    Ok(Json(ReferralStatsResponseDto {
        status: "success".to_string(),
        data: stats.into(),
    }))
}
