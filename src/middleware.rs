// middleware.rs
use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ErrorMessage, HttpError},
    utils::wallet::{looks_like_address, normalize_address},
    AppState,
};

/// Identity of the calling wallet, as proven by the upstream auth layer.
/// The core trusts the header; signature verification happens before the
/// request ever reaches this service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WalletIdentity {
    pub address: String,
}

pub async fn wallet_identity(
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let header = req
        .headers()
        .get("x-wallet-address")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let address = header.ok_or_else(|| {
        HttpError::unauthorized(ErrorMessage::WalletAddressNotProvided.to_str())
    })?;

    if !looks_like_address(&address) {
        return Err(HttpError::bad_request(
            ErrorMessage::InvalidWalletAddress.to_str(),
        ));
    }

    req.extensions_mut().insert(WalletIdentity {
        address: normalize_address(&address),
    });

    Ok(next.run(req).await)
}

pub async fn admin_guard(
    Extension(app_state): Extension<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let key = req
        .headers()
        .get("x-admin-key")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::AdminKeyNotProvided.to_str()))?;

    if key != app_state.env.admin_api_key {
        return Err(HttpError::unauthorized(
            ErrorMessage::InvalidAdminKey.to_str(),
        ));
    }

    Ok(next.run(req).await)
}
