// handler/admin.rs
//
// Operator surface. Every route here sits behind the admin key guard.
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::store::{PointsStore, ProfileStore, ReferralStore, TaskStore},
    dtos::{
        admindtos::*,
        profiledtos::{FilterProfileDto, ProfileMutationResponseDto},
        taskdtos::CompletionResponseDto,
    },
    error::{ErrorMessage, HttpError},
    models::pointsmodel::TransactionType,
    service::reconciliation::SweepReport,
    utils::wallet::{looks_like_address, normalize_address},
    AppState,
};

pub fn admin_handler() -> Router {
    Router::new()
        .route("/profiles", get(list_profiles))
        .route("/profiles/:wallet", get(get_profile_detail))
        .route("/adjust", post(adjust_points))
        .route("/revoke/:completion_id", post(revoke_completion))
        .route("/reconcile/memberships", post(reconcile_memberships))
        .route("/reconcile/tweets", post(reconcile_tweets))
        .route("/stats", get(get_stats))
}

pub async fn list_profiles(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query.page.unwrap_or(1) as u32;
    let limit = query.limit.unwrap_or(20);

    let profiles = app_state.store.list_profiles(page, limit).await?;
    let total = app_state.store.count_profiles().await?;

    let profiles: Vec<FilterProfileDto> =
        profiles.iter().map(FilterProfileDto::filter_profile).collect();

    Ok(Json(ProfileListResponseDto {
        status: "success".to_string(),
        results: profiles.len(),
        total,
        profiles,
    }))
}

pub async fn get_profile_detail(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(wallet): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let wallet = normalize_address(&wallet);

    let profile = app_state
        .store
        .get_profile(&wallet)
        .await?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ProfileNotFound.to_str()))?;

    let history = app_state.store.history_for(&wallet, 1, 100).await?;
    let completions = app_state.store.list_completions(&wallet, 1, 100).await?;

    Ok(Json(ProfileDetailResponseDto {
        status: "success".to_string(),
        profile: FilterProfileDto::filter_profile(&profile),
        history,
        completions,
    }))
}

pub async fn adjust_points(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<AdminAdjustDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let wallet = normalize_address(&body.wallet_address);
    if !looks_like_address(&wallet) {
        return Err(HttpError::bad_request(
            ErrorMessage::InvalidWalletAddress.to_str(),
        ));
    }

    let balance = app_state
        .points_engine
        .add_points(
            &wallet,
            body.delta,
            TransactionType::AdminAdjustment,
            &body.description,
        )
        .await?;

    let profile = app_state
        .store
        .get_profile(&wallet)
        .await?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ProfileNotFound.to_str()))?;

    Ok(Json(ProfileMutationResponseDto {
        status: "success".to_string(),
        message: format!("Adjusted {} by {} points", wallet, body.delta),
        balance,
        data: FilterProfileDto::filter_profile(&profile),
    }))
}

pub async fn revoke_completion(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(completion_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let (completion, balance) = app_state
        .tasks
        .revoke_task_points(completion_id)
        .await?;

    Ok(Json(CompletionResponseDto {
        status: "success".to_string(),
        message: "Task completion revoked".to_string(),
        balance,
        data: completion,
    }))
}

#[derive(serde::Serialize)]
struct SweepResponseDto {
    status: String,
    report: SweepReport,
}

pub async fn reconcile_memberships(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let report = app_state.reconciliation.reconcile_all_memberships().await?;

    Ok(Json(SweepResponseDto {
        status: "success".to_string(),
        report,
    }))
}

pub async fn reconcile_tweets(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SweepScopeDto>,
) -> Result<impl IntoResponse, HttpError> {
    let scope = body.wallet_address.as_deref().map(normalize_address);
    let report = app_state
        .reconciliation
        .reconcile_active_tweets(scope.as_deref())
        .await?;

    Ok(Json(SweepResponseDto {
        status: "success".to_string(),
        report,
    }))
}

pub async fn get_stats(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let total_profiles = app_state.store.count_profiles().await?;
    let total_points_outstanding = app_state.store.total_points_outstanding().await?;
    let active_completions = app_state.store.count_active_completions().await?;
    let total_referrals = app_state.store.count_referrals().await?;
    let ledger_drift = app_state.store.ledger_drift().await?;

    Ok(Json(AdminStatsResponseDto {
        status: "success".to_string(),
        total_profiles,
        total_points_outstanding,
        active_completions,
        total_referrals,
        ledger_drift,
    }))
}
