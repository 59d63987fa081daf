// handler/profile.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::store::ProfileStore,
    dtos::profiledtos::*,
    error::HttpError,
    middleware::WalletIdentity,
    models::profilemodel::{Platform, PlatformIdentity, WalletProfile},
    utils::wallet::infer_chain,
    AppState,
};

pub fn profile_handler() -> Router {
    Router::new()
        .route("/", get(get_profile))
        .route("/connect/:platform", post(connect_platform))
        .route("/disconnect/:platform", post(disconnect_platform))
        .route("/verify-discord", post(verify_discord))
        .route("/claim-bonus", post(claim_connect_bonus))
}

fn parse_platform(platform: &str) -> Result<Platform, HttpError> {
    platform.parse::<Platform>().map_err(HttpError::bad_request)
}

fn mutation_response(
    message: impl Into<String>,
    profile: &WalletProfile,
    balance: i64,
) -> Json<ProfileMutationResponseDto> {
    Json(ProfileMutationResponseDto {
        status: "success".to_string(),
        message: message.into(),
        balance,
        data: FilterProfileDto::filter_profile(profile),
    })
}

pub async fn get_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(wallet): Extension<WalletIdentity>,
) -> Result<impl IntoResponse, HttpError> {
    // Fail-open re-verification: an indeterminate or failed check leaves
    // the profile as-is.
    if let Err(err) = app_state
        .reconciliation
        .reconcile_wallet_membership(&wallet.address)
        .await
    {
        tracing::warn!("profile fetch reconcile failed for {}: {}", wallet.address, err);
    }

    let profile = app_state
        .store
        .get_or_create_profile(&wallet.address, infer_chain(&wallet.address))
        .await?;

    Ok(Json(ProfileResponseDto {
        status: "success".to_string(),
        data: FilterProfileDto::filter_profile(&profile),
    }))
}

pub async fn connect_platform(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(wallet): Extension<WalletIdentity>,
    Path(platform): Path<String>,
    Json(body): Json<ConnectPlatformDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    let platform = parse_platform(&platform)?;

    let (profile, balance) = app_state
        .connections
        .connect_platform(
            &wallet.address,
            platform,
            PlatformIdentity {
                username: body.username,
                external_id: body.external_id,
            },
        )
        .await?;

    Ok(mutation_response(
        format!("{} account connected", platform.to_str()),
        &profile,
        balance,
    ))
}

pub async fn disconnect_platform(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(wallet): Extension<WalletIdentity>,
    Path(platform): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let platform = parse_platform(&platform)?;

    let (profile, balance) = app_state
        .connections
        .disconnect_platform(&wallet.address, platform)
        .await?;

    Ok(mutation_response(
        format!("{} account disconnected", platform.to_str()),
        &profile,
        balance,
    ))
}

pub async fn verify_discord(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(wallet): Extension<WalletIdentity>,
) -> Result<impl IntoResponse, HttpError> {
    let (profile, balance) = app_state
        .connections
        .verify_discord_membership(&wallet.address)
        .await?;

    Ok(mutation_response(
        "Discord server membership verified",
        &profile,
        balance,
    ))
}

pub async fn claim_connect_bonus(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(wallet): Extension<WalletIdentity>,
) -> Result<impl IntoResponse, HttpError> {
    let (profile, balance) = app_state
        .connections
        .claim_connect_bonus(&wallet.address)
        .await?;

    Ok(mutation_response(
        "One-time connect bonus claimed",
        &profile,
        balance,
    ))
}
