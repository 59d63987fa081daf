// handler/tasks.rs
use std::sync::Arc;

use axum::{
    extract::Query,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{admindtos::RequestQueryDto, taskdtos::*},
    error::HttpError,
    middleware::WalletIdentity,
    AppState,
};

pub fn tasks_handler() -> Router {
    Router::new()
        .route("/", get(list_completions))
        .route("/daily-post", post(complete_daily_post))
}

pub async fn complete_daily_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(wallet): Extension<WalletIdentity>,
    Json(body): Json<DailyPostDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (completion, balance) = app_state
        .tasks
        .complete_daily_post(&wallet.address, body.tweet_url)
        .await?;

    Ok(Json(CompletionResponseDto {
        status: "success".to_string(),
        message: "Daily post recorded".to_string(),
        balance,
        data: completion,
    }))
}

pub async fn list_completions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(wallet): Extension<WalletIdentity>,
    Query(query): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query.page.unwrap_or(1) as u32;
    let limit = query.limit.unwrap_or(20);

    let completions = app_state
        .tasks
        .completions_for(&wallet.address, page, limit)
        .await?;

    Ok(Json(CompletionListResponseDto {
        status: "success".to_string(),
        results: completions.len(),
        completions,
    }))
}
